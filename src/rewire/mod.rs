//! Fixed-sparsity rewiring (DEEP-R style)
//!
//! After every batch the controller:
//!
//! 1. validates that pruned weights are zero, that every layer still holds its
//!    configured connectivity, and that the optimizer left the masks alone;
//! 2. prunes connections whose weight changed sign during the update;
//! 3. grows the same number of connections at randomly drawn inactive
//!    positions, zeroing the kernel wherever the mask changed.
//!
//! With `fixed_conn` only step 1 runs, which gives a static sparse baseline.
//! With `soft_limit` the connectivity and mask-identity checks are reported
//! as warnings instead of errors; the pruned-weight check always applies.
//!
//! # References
//!
//! - Bellec, G., et al. (2018). Deep Rewiring: Training very sparse deep
//!   networks. ICLR.

mod callback;
mod config;
mod invariants;
mod snapshot;
mod stats;
mod step;


pub use callback::{BatchReport, RewiringCallback};
pub use config::{CandidatePool, InfeasiblePolicy, RewiringConfig};
pub use invariants::{check_connectivity, check_mask_unchanged, check_pruned_weights};
pub use snapshot::{LayerSnapshot, ModelSnapshot};
pub use stats::{BatchRewiring, EpochReport, LayerConnectivity, RewiringStats};
pub use step::{sign, sign_flips, RewiringEvent};
