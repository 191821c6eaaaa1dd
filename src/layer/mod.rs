//! Layers that can take part in rewiring
//!
//! A layer opts in by returning its [`SparseWeights`] from
//! [`Layer::sparse_weights`]. Layers that return `None` (activations,
//! pooling, anything without a kernel) are skipped by the controller, and the
//! remaining layers are enumerated in slice order.

mod dense;
mod sparse_weights;

pub use dense::SparseDense;
pub use sparse_weights::{expected_active, is_realizable, SparseWeights};

/// Trait for layers handed to the rewiring controller
pub trait Layer {
    /// Layer name used in reports and errors
    fn name(&self) -> &str;

    /// Kernel/mask pair, or `None` if the layer does not participate in rewiring
    fn sparse_weights(&self) -> Option<&SparseWeights> {
        None
    }

    /// Mutable kernel/mask pair
    fn sparse_weights_mut(&mut self) -> Option<&mut SparseWeights> {
        None
    }

    /// Whether the controller should track this layer
    fn is_rewirable(&self) -> bool {
        self.sparse_weights().is_some()
    }
}

impl<L: Layer + ?Sized> Layer for Box<L> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn sparse_weights(&self) -> Option<&SparseWeights> {
        (**self).sparse_weights()
    }

    fn sparse_weights_mut(&mut self) -> Option<&mut SparseWeights> {
        (**self).sparse_weights_mut()
    }
}

/// Iterate the participating layers as `(rewirable_index, layer, weights)`
pub(crate) fn rewirable<L: Layer>(
    layers: &[L],
) -> impl Iterator<Item = (usize, &L, &SparseWeights)> {
    layers
        .iter()
        .filter_map(|l| l.sparse_weights().map(|w| (l, w)))
        .enumerate()
        .map(|(i, (l, w))| (i, l, w))
}
