//! Sparse fully connected layer

use super::{Layer, SparseWeights};
use crate::error::Result;
use ndarray::{Array1, Array2};
use rand::Rng;

/// Dense layer whose connections are gated by a mask
#[derive(Clone, Debug)]
pub struct SparseDense {
    name: String,
    weights: SparseWeights,
    bias: Option<Array1<f32>>,
}

impl SparseDense {
    /// Create a layer from existing weights (no bias)
    pub fn new(name: impl Into<String>, weights: SparseWeights) -> Self {
        Self {
            name: name.into(),
            weights,
            bias: None,
        }
    }

    /// Create a randomly initialized layer at the given connectivity
    pub fn random<R: Rng + ?Sized>(
        name: impl Into<String>,
        inputs: usize,
        outputs: usize,
        proportion: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let weights = SparseWeights::random(inputs, outputs, proportion, rng)?;
        Ok(Self::new(name, weights).with_bias(Array1::zeros(outputs)))
    }

    /// Attach a bias vector
    pub fn with_bias(mut self, bias: Array1<f32>) -> Self {
        self.bias = Some(bias);
        self
    }

    /// Bias vector, if any
    pub fn bias(&self) -> Option<&Array1<f32>> {
        self.bias.as_ref()
    }

    /// Kernel/mask pair
    pub fn weights(&self) -> &SparseWeights {
        &self.weights
    }

    /// Mutable kernel/mask pair
    pub fn weights_mut(&mut self) -> &mut SparseWeights {
        &mut self.weights
    }

    /// Forward pass `x · (kernel ⊙ mask) + bias` for a `(batch, inputs)` input
    pub fn forward(&self, input: &Array2<f32>) -> Array2<f32> {
        // Inactive entries are already zero, so the kernel can be used directly.
        let out = input.dot(self.weights.kernel());
        match &self.bias {
            Some(b) => out + b,
            None => out,
        }
    }
}

impl Layer for SparseDense {
    fn name(&self) -> &str {
        &self.name
    }

    fn sparse_weights(&self) -> Option<&SparseWeights> {
        Some(&self.weights)
    }

    fn sparse_weights_mut(&mut self) -> Option<&mut SparseWeights> {
        Some(&mut self.weights)
    }
}
