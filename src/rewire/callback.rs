//! Rewiring controller.
//!
//! Hook order per batch is `before_batch` → optimizer update → `after_batch`.
//! The snapshot returned by `before_batch` is moved into `after_batch`, so a
//! snapshot cannot be reused or paired with the wrong update.

use super::config::RewiringConfig;
use super::invariants::{check_connectivity, check_mask_unchanged, check_pruned_weights};
use super::snapshot::ModelSnapshot;
use super::stats::{BatchRewiring, EpochReport, LayerConnectivity, RewiringStats};
use super::step::{self, RewiringEvent};
use crate::error::{RewireError, Result};
use crate::layer::{self, Layer};
use crate::train::CallbackContext;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, warn};

/// Outcome of one `after_batch` call
#[derive(Clone, Debug, PartialEq)]
pub struct BatchReport {
    pub epoch: usize,
    pub step: usize,
    /// One event per rewirable layer; empty when connectivity is fixed
    pub events: Vec<RewiringEvent>,
}

impl BatchReport {
    /// Connections rewired across all layers
    pub fn total_rewired(&self) -> usize {
        self.events.iter().map(RewiringEvent::len).sum()
    }
}

/// DEEP-R style rewiring controller.
///
/// Holds every rewirable layer at its configured connectivity: connections
/// whose weight changed sign during the update are pruned and replaced by
/// randomly drawn inactive ones.
///
/// # Example
///
/// ```
/// use recablear::layer::SparseDense;
/// use recablear::rewire::{RewiringCallback, RewiringConfig};
/// use recablear::train::CallbackContext;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(0);
/// let mut layers = vec![SparseDense::random("fc1", 8, 4, 0.25, &mut rng).unwrap()];
/// let mut rewiring = RewiringCallback::new(RewiringConfig::new(vec![0.25]).with_seed(1)).unwrap();
///
/// let pre = rewiring.before_batch(&layers);
/// // ... optimizer update ...
/// let report = rewiring.after_batch(&mut layers, pre, &CallbackContext::default()).unwrap();
/// assert_eq!(report.total_rewired(), 0);
/// ```
#[derive(Debug)]
pub struct RewiringCallback {
    config: RewiringConfig,
    rng: StdRng,
    stats: RewiringStats,
}

impl RewiringCallback {
    /// Create a controller from a validated configuration.
    pub fn new(config: RewiringConfig) -> Result<Self> {
        config.validate()?;
        if !config.asserts_on() {
            warn!("Invariant checks are off: pruned weights, connectivity and masks go unverified");
        }
        let rng = match config.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            config,
            rng,
            stats: RewiringStats::new(),
        })
    }

    pub fn config(&self) -> &RewiringConfig {
        &self.config
    }

    /// Accumulated epoch and batch statistics
    pub fn stats(&self) -> &RewiringStats {
        &self.stats
    }

    /// Capture the pre-update snapshot.
    pub fn before_batch<L: Layer>(&self, layers: &[L]) -> ModelSnapshot {
        ModelSnapshot::capture(layers)
    }

    /// Validate the update and rewire.
    ///
    /// Any error is fatal for the run. On error the layers are left exactly as
    /// the optimizer produced them.
    pub fn after_batch<L: Layer>(
        &mut self,
        layers: &mut [L],
        pre: ModelSnapshot,
        ctx: &CallbackContext,
    ) -> Result<BatchReport> {
        self.check_and_rewire(layers, &pre, ctx).inspect_err(|e| {
            error!(
                epoch = ctx.epoch,
                step = ctx.step,
                "Rewiring aborted: {e}"
            );
        })
    }

    fn check_and_rewire<L: Layer>(
        &mut self,
        layers: &mut [L],
        pre: &ModelSnapshot,
        ctx: &CallbackContext,
    ) -> Result<BatchReport> {
        let post = ModelSnapshot::capture(layers);
        if post.len() != self.config.num_layers() {
            return Err(RewireError::LayerCountMismatch {
                expected: self.config.num_layers(),
                found: post.len(),
            });
        }
        pre.ensure_compatible(&post)?;

        if self.config.asserts_on() {
            let soft = self.config.soft_limit();
            for (snap, &target) in post.layers().iter().zip(self.config.connectivity_proportion()) {
                check_pruned_weights(snap)?;
                soft_or_fail(soft, check_connectivity(snap, target))?;
            }
            for (before, after) in pre.layers().iter().zip(post.layers()) {
                soft_or_fail(soft, check_mask_unchanged(before, after))?;
            }
        }

        if self.config.fixed_conn() {
            self.stats.record_batch(BatchRewiring {
                epoch: ctx.epoch,
                step: ctx.step,
                global_step: ctx.global_step,
                rewired: vec![0; post.len()],
            });
            return Ok(BatchReport {
                epoch: ctx.epoch,
                step: ctx.step,
                events: Vec::new(),
            });
        }

        // Plan every layer before committing any, so a sampling failure
        // leaves the whole model untouched.
        let events = pre
            .layers()
            .iter()
            .zip(post.layers())
            .map(|(before, after)| {
                step::plan(
                    before,
                    after,
                    self.config.candidate_pool(),
                    self.config.on_infeasible(),
                    &mut self.rng,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        commit(layers, &post, &events)?;

        for event in events.iter().filter(|e| !e.is_empty()) {
            debug!(
                layer = %event.layer,
                pruned = event.pruned.len(),
                retained = event.retained,
                "rewired connections"
            );
        }

        self.stats.record_batch(BatchRewiring {
            epoch: ctx.epoch,
            step: ctx.step,
            global_step: ctx.global_step,
            rewired: events.iter().map(RewiringEvent::len).collect(),
        });

        Ok(BatchReport {
            epoch: ctx.epoch,
            step: ctx.step,
            events,
        })
    }

    /// Record and report per-layer connectivity at the end of an epoch.
    pub fn after_epoch<L: Layer>(&mut self, layers: &[L], epoch: usize) -> EpochReport {
        let connectivity: Vec<LayerConnectivity> = layer::rewirable(layers)
            .map(|(_, l, w)| LayerConnectivity {
                layer: l.name().to_string(),
                connections: w.active_count(),
                size: w.len(),
                proportion: w.proportion(),
            })
            .collect();

        self.stats.record_epoch(epoch, connectivity.clone());
        let report = EpochReport {
            epoch,
            layers: connectivity,
        };
        info!("{report}");
        report
    }
}

/// Apply each event to the layer it was planned from.
///
/// Layers are matched by position among the layers exposing weights. Every
/// tracked layer must hand out mutable weights of the snapshot's name and
/// shape; this is verified for all of them before any is modified.
fn commit<L: Layer>(
    layers: &mut [L],
    post: &ModelSnapshot,
    events: &[RewiringEvent],
) -> Result<()> {
    let mut tracked = 0;
    for l in layers.iter_mut() {
        if l.sparse_weights().is_none() {
            continue;
        }
        let name = l.name().to_string();
        let snap = post.layers().get(tracked).ok_or_else(|| RewireError::SnapshotMismatch {
            layer: name.clone(),
            reason: format!("no planned rewiring for tracked layer {tracked}"),
        })?;
        if snap.name != name {
            return Err(RewireError::SnapshotMismatch {
                layer: name,
                reason: format!("rewiring was planned for layer '{}'", snap.name),
            });
        }
        match l.sparse_weights_mut() {
            Some(w) if w.shape() == snap.kernel.dim() && w.mask().dim() == snap.mask.dim() => {}
            Some(w) => {
                return Err(RewireError::SnapshotMismatch {
                    layer: name,
                    reason: format!(
                        "writable weights have shape {:?}, planned for {:?}",
                        w.shape(),
                        snap.kernel.dim()
                    ),
                });
            }
            None => {
                return Err(RewireError::SnapshotMismatch {
                    layer: name,
                    reason: "layer exposes weights but no mutable access".to_string(),
                });
            }
        }
        tracked += 1;
    }
    if tracked != events.len() {
        return Err(RewireError::SnapshotMismatch {
            layer: "<model>".to_string(),
            reason: format!("{} rewiring events for {tracked} tracked layers", events.len()),
        });
    }

    let mut events = events.iter();
    for l in layers.iter_mut() {
        if l.sparse_weights().is_none() {
            continue;
        }
        if let (Some(weights), Some(event)) = (l.sparse_weights_mut(), events.next()) {
            event.apply(weights);
        }
    }
    Ok(())
}

/// In soft-limit mode a failed check is logged and ignored.
fn soft_or_fail(soft: bool, check: Result<()>) -> Result<()> {
    match check {
        Err(e) if soft => {
            warn!("Soft limit: ignoring {e}");
            Ok(())
        }
        other => other,
    }
}
