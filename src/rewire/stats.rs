//! Connectivity statistics accumulated over a training run.

use crate::error::{RewireError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::Path;

/// Connection count of one layer at the end of an epoch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerConnectivity {
    pub layer: String,
    /// Active connections, `sum(mask)`
    pub connections: usize,
    /// Potential connections, `size(mask)`
    pub size: usize,
    /// `connections / size`
    pub proportion: f64,
}

/// Per-layer rewiring counts for one batch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchRewiring {
    pub epoch: usize,
    pub step: usize,
    pub global_step: usize,
    /// Connections rewired, indexed like the rewirable layers
    pub rewired: Vec<usize>,
}

impl BatchRewiring {
    pub fn total(&self) -> usize {
        self.rewired.iter().sum()
    }
}

/// Epoch-level and batch-level statistics
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RewiringStats {
    epoch_data: BTreeMap<usize, Vec<LayerConnectivity>>,
    batch_data: Vec<BatchRewiring>,
}

impl RewiringStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_epoch(&mut self, epoch: usize, layers: Vec<LayerConnectivity>) {
        self.epoch_data.insert(epoch, layers);
    }

    pub(crate) fn record_batch(&mut self, batch: BatchRewiring) {
        self.batch_data.push(batch);
    }

    /// Epoch index → per-layer connectivity
    pub fn epoch_data(&self) -> &BTreeMap<usize, Vec<LayerConnectivity>> {
        &self.epoch_data
    }

    /// Rewiring counts for every batch seen, in order
    pub fn batch_data(&self) -> &[BatchRewiring] {
        &self.batch_data
    }

    /// Epoch index → connectivity for a single layer
    pub fn layer_history(&self, layer: &str) -> BTreeMap<usize, &LayerConnectivity> {
        self.epoch_data
            .iter()
            .filter_map(|(&epoch, layers)| {
                layers
                    .iter()
                    .find(|l| l.layer == layer)
                    .map(|l| (epoch, l))
            })
            .collect()
    }

    /// Total connections rewired over the run
    pub fn total_rewired(&self) -> usize {
        self.batch_data.iter().map(BatchRewiring::total).sum()
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the full statistics as JSON
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|e| RewireError::io(path, e))
    }

    /// Write one `epoch,layer,connections,proportion` row per epoch and layer
    pub fn write_epoch_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut out = Vec::new();
        self.write_epoch_rows(&mut out)
            .map_err(|e| RewireError::io(path, e))?;
        std::fs::write(path, out).map_err(|e| RewireError::io(path, e))
    }

    fn write_epoch_rows<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        writeln!(w, "epoch,layer,connections,proportion")?;
        for (epoch, layers) in &self.epoch_data {
            for l in layers {
                writeln!(w, "{},{},{},{}", epoch, l.layer, l.connections, l.proportion)?;
            }
        }
        Ok(())
    }
}

/// Per-epoch connectivity report
#[derive(Clone, Debug, PartialEq)]
pub struct EpochReport {
    pub epoch: usize,
    pub layers: Vec<LayerConnectivity>,
}

impl fmt::Display for EpochReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Epoch {:3} results:", self.epoch)?;
        for l in &self.layers {
            write!(
                f,
                "\nLayer {:10} has {:8} connections, corresponding to {:>5.1}% of the total connectivity",
                l.layer,
                l.connections,
                l.proportion * 100.0
            )?;
        }
        Ok(())
    }
}
