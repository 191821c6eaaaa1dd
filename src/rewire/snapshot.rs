//! Kernel/mask snapshots taken around the optimizer update.

use crate::error::{RewireError, Result};
use crate::layer::{self, Layer};
use ndarray::Array2;

/// Copy of one rewirable layer's state
#[derive(Clone, Debug, PartialEq)]
pub struct LayerSnapshot {
    /// Index among the rewirable layers (not the full layer list)
    pub index: usize,
    pub name: String,
    pub kernel: Array2<f32>,
    pub mask: Array2<bool>,
}

/// Ordered snapshot of every rewirable layer.
///
/// Returned by [`RewiringCallback::before_batch`](super::RewiringCallback::before_batch)
/// and consumed by `after_batch`, so a snapshot can only pair with one update.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelSnapshot {
    layers: Vec<LayerSnapshot>,
}

impl ModelSnapshot {
    /// Copy kernel and mask of every layer exposing them, in enumeration order
    pub fn capture<L: Layer>(layers: &[L]) -> Self {
        let layers = layer::rewirable(layers)
            .map(|(index, l, w)| LayerSnapshot {
                index,
                name: l.name().to_string(),
                kernel: w.kernel().clone(),
                mask: w.mask().clone(),
            })
            .collect();
        Self { layers }
    }

    pub fn layers(&self) -> &[LayerSnapshot] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Check that `other` describes the same layers (count, names, shapes) and
    /// that every kernel matches its mask
    pub(crate) fn ensure_compatible(&self, other: &ModelSnapshot) -> Result<()> {
        if self.len() != other.len() {
            return Err(RewireError::SnapshotMismatch {
                layer: "<model>".to_string(),
                reason: format!(
                    "pre-update snapshot has {} layers, post-update has {}",
                    self.len(),
                    other.len()
                ),
            });
        }
        for (pre, post) in self.layers.iter().zip(&other.layers) {
            for snap in [pre, post] {
                if snap.mask.dim() != snap.kernel.dim() {
                    return Err(RewireError::SnapshotMismatch {
                        layer: snap.name.clone(),
                        reason: format!(
                            "mask shape {:?} differs from kernel shape {:?}",
                            snap.mask.dim(),
                            snap.kernel.dim()
                        ),
                    });
                }
            }
            if pre.name != post.name {
                return Err(RewireError::SnapshotMismatch {
                    layer: post.name.clone(),
                    reason: format!("expected layer '{}' at index {}", pre.name, pre.index),
                });
            }
            if pre.kernel.dim() != post.kernel.dim() {
                return Err(RewireError::SnapshotMismatch {
                    layer: post.name.clone(),
                    reason: format!(
                        "shape changed from {:?} to {:?}",
                        pre.kernel.dim(),
                        post.kernel.dim()
                    ),
                });
            }
        }
        Ok(())
    }
}
