//! Hook driver for rewired training
//!
//! Gradient computation stays with the caller. The trainer sequences the
//! rewiring hooks around each optimizer update and threads the pre-update
//! snapshot from one hook to the next.

use super::callback::CallbackContext;
use super::optim::Optimizer;
use crate::error::Result;
use crate::layer::{Layer, SparseWeights};
use crate::rewire::{BatchReport, EpochReport, LayerConnectivity, RewiringCallback, RewiringStats};
use ndarray::Array2;

/// Result of a completed training run
#[derive(Clone, Debug, PartialEq)]
pub struct TrainResult {
    /// Epochs that ran to completion
    pub epochs_completed: usize,
    /// Connections rewired over the whole run
    pub total_rewired: usize,
    /// Connectivity reported at the end of the last epoch
    pub final_connectivity: Vec<LayerConnectivity>,
}

/// Runs the before-batch → update → after-batch sequence for a set of layers
pub struct RewiringTrainer<L: Layer> {
    layers: Vec<L>,
    optimizer: Box<dyn Optimizer>,
    rewiring: RewiringCallback,
    global_step: usize,
}

impl<L: Layer> RewiringTrainer<L> {
    /// Create a new trainer
    pub fn new(layers: Vec<L>, optimizer: Box<dyn Optimizer>, rewiring: RewiringCallback) -> Self {
        Self {
            layers,
            optimizer,
            rewiring,
            global_step: 0,
        }
    }

    /// Get reference to the layers
    pub fn layers(&self) -> &[L] {
        &self.layers
    }

    /// Consume the trainer and return the layers
    pub fn into_layers(self) -> Vec<L> {
        self.layers
    }

    /// Get reference to the rewiring controller
    pub fn rewiring(&self) -> &RewiringCallback {
        &self.rewiring
    }

    /// Accumulated rewiring statistics
    pub fn stats(&self) -> &RewiringStats {
        self.rewiring.stats()
    }

    /// Get current learning rate
    pub fn lr(&self) -> f32 {
        self.optimizer.lr()
    }

    /// Set learning rate
    pub fn set_lr(&mut self, lr: f32) {
        self.optimizer.set_lr(lr);
    }

    /// Run one batch with a caller-supplied update in place of the optimizer.
    pub fn run_batch<F>(&mut self, ctx: &CallbackContext, update: F) -> Result<BatchReport>
    where
        F: FnOnce(&mut [L]),
    {
        let pre = self.rewiring.before_batch(&self.layers);
        update(&mut self.layers);
        self.finish_batch(pre, ctx)
    }

    /// Run one batch: optimizer step with `grads` (one per rewirable layer),
    /// then rewiring.
    pub fn step(&mut self, ctx: &CallbackContext, grads: &[Array2<f32>]) -> Result<BatchReport> {
        let pre = self.rewiring.before_batch(&self.layers);
        {
            let mut params: Vec<&mut SparseWeights> = self
                .layers
                .iter_mut()
                .filter_map(|l| l.sparse_weights_mut())
                .collect();
            self.optimizer.step(&mut params, grads)?;
        }
        self.finish_batch(pre, ctx)
    }

    fn finish_batch(
        &mut self,
        pre: crate::rewire::ModelSnapshot,
        ctx: &CallbackContext,
    ) -> Result<BatchReport> {
        let report = self.rewiring.after_batch(&mut self.layers, pre, ctx)?;
        self.global_step += 1;
        Ok(report)
    }

    /// Close an epoch: record and report connectivity
    pub fn end_epoch(&mut self, epoch: usize) -> EpochReport {
        self.rewiring.after_epoch(&self.layers, epoch)
    }

    /// Train for `max_epochs` epochs of `steps_per_epoch` batches.
    ///
    /// `grad_fn` returns one gradient per rewirable layer for the current
    /// state. The first rewiring error aborts the run.
    pub fn train<G>(
        &mut self,
        max_epochs: usize,
        steps_per_epoch: usize,
        mut grad_fn: G,
    ) -> Result<TrainResult>
    where
        G: FnMut(&CallbackContext, &[L]) -> Vec<Array2<f32>>,
    {
        let mut final_connectivity = Vec::new();

        for epoch in 0..max_epochs {
            for step in 0..steps_per_epoch {
                let ctx = CallbackContext {
                    epoch,
                    max_epochs,
                    step,
                    steps_per_epoch,
                    global_step: self.global_step,
                    lr: self.lr(),
                };
                let grads = grad_fn(&ctx, &self.layers);
                self.step(&ctx, &grads)?;
            }
            final_connectivity = self.end_epoch(epoch).layers;
        }

        Ok(TrainResult {
            epochs_completed: max_epochs,
            total_rewired: self.stats().total_rewired(),
            final_connectivity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::SparseDense;
    use crate::rewire::RewiringConfig;
    use crate::train::MaskedSgd;
    use crate::RewireError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn trainer(fixed: bool) -> RewiringTrainer<SparseDense> {
        let mut rng = StdRng::seed_from_u64(10);
        let layers = vec![
            SparseDense::random("fc1", 12, 8, 0.25, &mut rng).unwrap(),
            SparseDense::random("fc2", 8, 4, 0.5, &mut rng).unwrap(),
        ];
        let config = RewiringConfig::new(vec![0.25, 0.5])
            .with_seed(4)
            .with_fixed_conn(fixed);
        RewiringTrainer::new(
            layers,
            Box::new(MaskedSgd::new(0.5, 0.0)),
            RewiringCallback::new(config).unwrap(),
        )
    }

    fn flip_all(_: &CallbackContext, layers: &[SparseDense]) -> Vec<Array2<f32>> {
        // Gradient of 4 * w moves every weight w -> -w at lr 0.5
        layers.iter().map(|l| l.weights().kernel() * 4.0).collect()
    }

    #[test]
    fn test_train_preserves_connectivity() {
        let mut t = trainer(false);
        let result = t.train(3, 4, flip_all).unwrap();
        assert_eq!(result.epochs_completed, 3);
        assert!(result.total_rewired > 0);
        assert_eq!(result.final_connectivity[0].connections, 24);
        assert_eq!(result.final_connectivity[1].connections, 16);
        assert_eq!(t.stats().epoch_data().len(), 3);
        assert_eq!(t.stats().batch_data().len(), 12);
    }

    #[test]
    fn test_fixed_conn_never_rewires() {
        let mut t = trainer(true);
        let masks_before: Vec<_> = t.layers().iter().map(|l| l.weights().mask().clone()).collect();
        let result = t.train(2, 3, flip_all).unwrap();
        assert_eq!(result.total_rewired, 0);
        for (layer, before) in t.layers().iter().zip(&masks_before) {
            assert_eq!(layer.weights().mask(), before);
        }
    }

    #[test]
    fn test_run_batch_reports_mask_tampering() {
        let mut t = trainer(false);
        let err = t
            .run_batch(&CallbackContext::default(), |layers| {
                let (mut kernel, mut mask) = layers[0].weights_mut().parts_mut();
                let flat = mask.iter().position(|&m| m).unwrap();
                let pos = (flat / mask.ncols(), flat % mask.ncols());
                mask[pos] = false;
                kernel[pos] = 0.0;
            })
            .unwrap_err();
        assert!(matches!(err, RewireError::ConnectivityDrift { .. }));
    }

    #[test]
    fn test_set_lr() {
        let mut t = trainer(false);
        t.set_lr(0.01);
        assert_eq!(t.lr(), 0.01);
    }
}
