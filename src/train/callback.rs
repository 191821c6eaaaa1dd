//! Training state passed to the rewiring hooks

/// Context passed to hooks with current training state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallbackContext {
    /// Current epoch (0-indexed)
    pub epoch: usize,
    /// Total epochs planned
    pub max_epochs: usize,
    /// Current step within epoch
    pub step: usize,
    /// Total steps in epoch
    pub steps_per_epoch: usize,
    /// Global step count
    pub global_step: usize,
    /// Current learning rate
    pub lr: f32,
}

impl CallbackContext {
    /// Context for a given position in the run
    pub fn at(epoch: usize, step: usize, steps_per_epoch: usize) -> Self {
        Self {
            epoch,
            step,
            steps_per_epoch,
            global_step: epoch * steps_per_epoch + step,
            ..Default::default()
        }
    }
}
