//! Training-side collaborators of the rewiring controller
//!
//! - [`CallbackContext`]: position in the run, passed to every hook
//! - [`Optimizer`] / [`MaskedSgd`]: updates that respect the mask
//! - [`RewiringTrainer`]: sequences the hooks around each update

mod callback;
mod optim;
mod trainer;

pub use callback::CallbackContext;
pub(crate) use optim::gaussian;
pub use optim::{MaskedSgd, Optimizer};
pub use trainer::{RewiringTrainer, TrainResult};
