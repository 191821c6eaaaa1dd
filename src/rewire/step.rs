//! The rewiring step for a single layer.
//!
//! Connections whose weight changed sign across the update are pruned and an
//! equal number of inactive connections are grown in their place.

use super::config::{CandidatePool, InfeasiblePolicy};
use super::snapshot::LayerSnapshot;
use crate::error::{RewireError, Result};
use crate::layer::SparseWeights;
use ndarray::Array2;
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Element-wise sign with `sign(0.0) == 0` (unlike `f32::signum`).
pub fn sign(x: f32) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Active positions whose weight sign differs between the two kernels.
///
/// Transitions to or from exact zero count as a change.
pub fn sign_flips(
    pre: &Array2<f32>,
    post: &Array2<f32>,
    mask: &Array2<bool>,
) -> Vec<(usize, usize)> {
    post.indexed_iter()
        .zip(pre.iter())
        .zip(mask.iter())
        .filter(|&(((_, &after), &before), &active)| active && sign(before) != sign(after))
        .map(|(((pos, _), _), _)| pos)
        .collect()
}

/// Connections pruned and grown in one layer during one batch
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RewiringEvent {
    /// Index among the rewirable layers
    pub layer_index: usize,
    pub layer: String,
    /// Deactivated positions
    pub pruned: Vec<(usize, usize)>,
    /// Newly activated positions
    pub grown: Vec<(usize, usize)>,
    /// Sign flips left active because too few candidates were available
    pub retained: usize,
}

impl RewiringEvent {
    /// Number of connections rewired
    pub fn len(&self) -> usize {
        self.pruned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pruned.is_empty()
    }

    /// Apply to the layer: prune, then grow, zeroing the kernel at every
    /// touched position.
    pub fn apply(&self, weights: &mut SparseWeights) {
        let (mut kernel, mut mask) = weights.parts_mut();
        for &pos in &self.pruned {
            mask[pos] = false;
            kernel[pos] = 0.0;
        }
        for &pos in &self.grown {
            mask[pos] = true;
            kernel[pos] = 0.0;
        }
    }
}

/// Plan the rewiring of one layer from its pre- and post-update snapshots.
///
/// The layer itself is not touched; call [`RewiringEvent::apply`] to commit.
pub fn plan<R: Rng + ?Sized>(
    pre: &LayerSnapshot,
    post: &LayerSnapshot,
    pool: CandidatePool,
    policy: InfeasiblePolicy,
    rng: &mut R,
) -> Result<RewiringEvent> {
    let mut event = RewiringEvent {
        layer_index: post.index,
        layer: post.name.clone(),
        ..Default::default()
    };

    let mut flipped = sign_flips(&pre.kernel, &post.kernel, &post.mask);
    if flipped.is_empty() {
        return Ok(event);
    }

    let mut candidates: Vec<(usize, usize)> = post
        .mask
        .indexed_iter()
        .filter(|&(_, &active)| !active)
        .map(|(pos, _)| pos)
        .collect();

    let required = flipped.len();
    let available = match pool {
        CandidatePool::PreviouslyInactive => candidates.len(),
        CandidatePool::AllInactive => candidates.len() + required,
    };

    if available < required {
        match policy {
            InfeasiblePolicy::Fail => {
                return Err(RewireError::SamplingInfeasible {
                    layer: post.name.clone(),
                    required,
                    available,
                });
            }
            InfeasiblePolicy::Clamp => {
                let keep = index::sample(&mut *rng, required, available);
                let mut chosen: Vec<(usize, usize)> = keep.iter().map(|i| flipped[i]).collect();
                chosen.sort_unstable();
                event.retained = required - available;
                flipped = chosen;
            }
        }
    }

    if pool == CandidatePool::AllInactive {
        candidates.extend_from_slice(&flipped);
    }

    let grown = index::sample(&mut *rng, candidates.len(), flipped.len())
        .iter()
        .map(|i| candidates[i])
        .collect();

    event.pruned = flipped;
    event.grown = grown;
    Ok(event)
}
