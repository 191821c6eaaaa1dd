//! Post-update invariant checks.
//!
//! Each check returns the first violation it finds as a [`RewireError`].

use super::snapshot::LayerSnapshot;
use crate::error::{RewireError, Result};
use crate::layer::{expected_active, is_realizable};
use ndarray::Zip;

/// Every pruned position must carry a zero weight.
pub fn check_pruned_weights(post: &LayerSnapshot) -> Result<()> {
    let violation = post
        .kernel
        .indexed_iter()
        .zip(post.mask.iter())
        .find(|&((_, &k), &m)| !m && k != 0.0);

    match violation {
        Some((((row, col), &value), _)) => Err(RewireError::PrunedWeightNonZero {
            layer: post.name.clone(),
            row,
            col,
            value,
        }),
        None => Ok(()),
    }
}

/// The active fraction must equal the configured proportion.
///
/// A proportion the layer size cannot hit exactly is rejected with
/// [`RewireError::UnrealizableProportion`]. Otherwise the mask must hold
/// exactly `expected * size` active entries.
pub fn check_connectivity(post: &LayerSnapshot, expected: f64) -> Result<()> {
    let size = post.mask.len();
    if !is_realizable(expected, size) {
        return Err(RewireError::UnrealizableProportion {
            layer: post.name.clone(),
            proportion: expected,
            size,
            nearest: if size == 0 {
                0.0
            } else {
                expected_active(expected, size) as f64 / size as f64
            },
        });
    }
    let active = post.mask.iter().filter(|&&m| m).count();
    if active == expected_active(expected, size) {
        return Ok(());
    }
    Err(RewireError::ConnectivityDrift {
        layer: post.name.clone(),
        expected,
        actual: if size == 0 { 0.0 } else { active as f64 / size as f64 },
        active,
        size,
    })
}

/// The optimizer must not touch the mask.
pub fn check_mask_unchanged(pre: &LayerSnapshot, post: &LayerSnapshot) -> Result<()> {
    let mut changed = 0usize;
    Zip::from(&pre.mask).and(&post.mask).for_each(|a, b| {
        if a != b {
            changed += 1;
        }
    });
    if changed == 0 {
        Ok(())
    } else {
        Err(RewireError::MaskMutated {
            layer: post.name.clone(),
            changed,
        })
    }
}
