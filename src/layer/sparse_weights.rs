//! Kernel/mask pair for a sparsely connected dense layer.

use crate::error::{RewireError, Result};
use ndarray::{Array2, ArrayViewMut2, Zip};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Weight matrix and connectivity mask of a sparse layer.
///
/// Both matrices share the same `(rows, cols)` shape. Construction applies the
/// mask, so a freshly built value always satisfies `!mask[i,j] => kernel[i,j] == 0`.
/// Mutable access is handed out to optimizers and to the rewiring controller;
/// the invariant is re-checked after every batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SparseWeights {
    kernel: Array2<f32>,
    mask: Array2<bool>,
}

impl SparseWeights {
    /// Build from an explicit kernel and mask.
    ///
    /// Kernel entries at inactive positions are zeroed.
    pub fn new(kernel: Array2<f32>, mask: Array2<bool>) -> Result<Self> {
        if kernel.dim() != mask.dim() {
            return Err(RewireError::ShapeMismatch {
                kernel: kernel.dim(),
                mask: mask.dim(),
            });
        }
        let mut weights = Self { kernel, mask };
        weights.apply_mask();
        Ok(weights)
    }

    /// Fully connected weights (every mask entry active)
    pub fn dense(kernel: Array2<f32>) -> Self {
        let mask = Array2::from_elem(kernel.dim(), true);
        Self { kernel, mask }
    }

    /// Random sparse weights with exactly `round(proportion * rows * cols)`
    /// active connections.
    ///
    /// Active positions are drawn uniformly without replacement and their
    /// weights initialized Glorot-uniform.
    pub fn random<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        proportion: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if !(proportion > 0.0 && proportion <= 1.0) {
            return Err(RewireError::InvalidProportion {
                index: 0,
                value: proportion,
            });
        }
        let size = rows * cols;
        let active = expected_active(proportion, size);

        let mut mask = Array2::from_elem((rows, cols), false);
        let mut kernel = Array2::zeros((rows, cols));
        let limit = (6.0 / (rows + cols).max(1) as f32).sqrt();

        for flat in index::sample(&mut *rng, size, active) {
            let pos = (flat / cols, flat % cols);
            mask[pos] = true;
            kernel[pos] = rng.random_range(-limit..=limit);
        }

        Ok(Self { kernel, mask })
    }

    /// Weight matrix
    pub fn kernel(&self) -> &Array2<f32> {
        &self.kernel
    }

    /// Mutable view of the weight matrix. Values can change, the shape cannot.
    pub fn kernel_mut(&mut self) -> ArrayViewMut2<'_, f32> {
        self.kernel.view_mut()
    }

    /// Connectivity mask (`true` = active)
    pub fn mask(&self) -> &Array2<bool> {
        &self.mask
    }

    /// Mutable view of the connectivity mask
    pub fn mask_mut(&mut self) -> ArrayViewMut2<'_, bool> {
        self.mask.view_mut()
    }

    /// Simultaneous mutable views of kernel and mask
    pub fn parts_mut(&mut self) -> (ArrayViewMut2<'_, f32>, ArrayViewMut2<'_, bool>) {
        (self.kernel.view_mut(), self.mask.view_mut())
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.kernel.dim()
    }

    /// Total number of potential connections
    pub fn len(&self) -> usize {
        self.mask.len()
    }

    /// True when the layer has no potential connections at all
    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    /// Number of active connections
    pub fn active_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Fraction of active connections, `active / len`
    pub fn proportion(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.active_count() as f64 / self.len() as f64
    }

    /// Zero every kernel entry whose connection is inactive
    pub fn apply_mask(&mut self) {
        Zip::from(&mut self.kernel)
            .and(&self.mask)
            .for_each(|k, &m| {
                if !m {
                    *k = 0.0;
                }
            });
    }

    /// First inactive position holding a nonzero weight, if any
    pub fn first_pruned_violation(&self) -> Option<((usize, usize), f32)> {
        self.kernel
            .indexed_iter()
            .zip(self.mask.iter())
            .find(|&((_, &k), &m)| !m && k != 0.0)
            .map(|((pos, &k), _)| (pos, k))
    }
}

/// Number of active connections a layer of `size` entries holds at `proportion`
pub fn expected_active(proportion: f64, size: usize) -> usize {
    (proportion * size as f64).round() as usize
}

/// Whether `size` connections can hold exactly `proportion` of them active.
///
/// True when `expected_active(proportion, size) / size` is the same `f64` as
/// `proportion`.
pub fn is_realizable(proportion: f64, size: usize) -> bool {
    size > 0 && expected_active(proportion, size) as f64 / size as f64 == proportion
}
