//! Recablear: fixed-sparsity synaptic rewiring for masked dense layers
//!
//! Sparse layers carry a weight `kernel` and a boolean `mask`. During training
//! a [`RewiringCallback`](rewire::RewiringCallback) keeps every layer at its
//! configured connectivity: after each batch, connections whose weight changed
//! sign are pruned and the same number of inactive connections are regrown at
//! random.
//!
//! # Example
//!
//! ```
//! use recablear::layer::SparseDense;
//! use recablear::rewire::{RewiringCallback, RewiringConfig};
//! use recablear::train::{MaskedSgd, RewiringTrainer};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let layers = vec![
//!     SparseDense::random("fc1", 16, 8, 0.25, &mut rng)?,
//!     SparseDense::random("fc2", 8, 2, 0.5, &mut rng)?,
//! ];
//! let rewiring = RewiringCallback::new(RewiringConfig::new(vec![0.25, 0.5]).with_seed(7))?;
//! let mut trainer = RewiringTrainer::new(layers, Box::new(MaskedSgd::new(0.1, 0.9)), rewiring);
//!
//! let result = trainer.train(2, 5, |_ctx, layers| {
//!     layers.iter().map(|l| l.weights().kernel() * 0.5).collect()
//! })?;
//! assert_eq!(result.final_connectivity[0].connections, 32);
//! # Ok::<(), recablear::RewireError>(())
//! ```

pub mod cli;
pub mod error;
pub mod layer;
pub mod rewire;
pub mod train;

pub use error::{Result, RewireError};
