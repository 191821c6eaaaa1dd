//! Rewiring configuration.

use crate::error::{RewireError, Result};
use crate::layer::{expected_active, is_realizable};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which inactive positions may receive a replacement connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidatePool {
    /// Only positions that were inactive before this batch's pruning.
    /// A connection pruned in a batch is never re-drawn in that same batch.
    #[default]
    PreviouslyInactive,
    /// Every inactive position after pruning, including the just-pruned ones.
    AllInactive,
}

/// What to do when fewer candidates exist than connections need rewiring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfeasiblePolicy {
    /// Abort with [`RewireError::SamplingInfeasible`]
    #[default]
    Fail,
    /// Prune only as many flipped connections as there are candidates; the
    /// remainder stay active.
    Clamp,
}

/// Configuration for [`RewiringCallback`](super::RewiringCallback).
///
/// # Example
///
/// ```
/// use recablear::rewire::{CandidatePool, RewiringConfig};
///
/// let config = RewiringConfig::new(vec![0.01, 0.03, 0.3])
///     .with_seed(42)
///     .with_candidate_pool(CandidatePool::AllInactive);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewiringConfig {
    /// Target fraction of active connections, one per rewirable layer, in
    /// layer enumeration order.
    connectivity_proportion: Vec<f64>,

    /// Run the post-update invariant checks. When off, rewiring proceeds
    /// without checking pruned weights, connectivity or mask identity.
    #[serde(default = "default_asserts_on")]
    asserts_on: bool,

    /// Relaxed validation: skip the connectivity and mask-identity checks.
    #[serde(default)]
    soft_limit: bool,

    /// Check invariants but never rewire (static sparse baseline).
    #[serde(default)]
    fixed_conn: bool,

    /// Seed for the replacement sampler. `None` seeds from the OS.
    #[serde(default)]
    seed: Option<u64>,

    #[serde(default)]
    candidate_pool: CandidatePool,

    #[serde(default)]
    on_infeasible: InfeasiblePolicy,
}

impl RewiringConfig {
    /// Hard rewiring at the given per-layer connectivity.
    pub fn new(connectivity_proportion: Vec<f64>) -> Self {
        Self {
            connectivity_proportion,
            asserts_on: true,
            soft_limit: false,
            fixed_conn: false,
            seed: None,
            candidate_pool: CandidatePool::default(),
            on_infeasible: InfeasiblePolicy::default(),
        }
    }

    /// Parse from a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| RewireError::io(path, e))?;
        Self::from_yaml_str(&yaml)
    }

    /// Enable or disable the invariant checks.
    pub fn with_asserts_on(mut self, asserts_on: bool) -> Self {
        self.asserts_on = asserts_on;
        self
    }

    /// Enable or disable soft-limit mode.
    pub fn with_soft_limit(mut self, soft_limit: bool) -> Self {
        self.soft_limit = soft_limit;
        self
    }

    /// Enable or disable fixed connectivity.
    pub fn with_fixed_conn(mut self, fixed_conn: bool) -> Self {
        self.fixed_conn = fixed_conn;
        self
    }

    /// Seed the sampler.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the candidate pool.
    pub fn with_candidate_pool(mut self, pool: CandidatePool) -> Self {
        self.candidate_pool = pool;
        self
    }

    /// Set the infeasibility policy.
    pub fn with_infeasible_policy(mut self, policy: InfeasiblePolicy) -> Self {
        self.on_infeasible = policy;
        self
    }

    pub fn connectivity_proportion(&self) -> &[f64] {
        &self.connectivity_proportion
    }

    pub fn asserts_on(&self) -> bool {
        self.asserts_on
    }

    pub fn soft_limit(&self) -> bool {
        self.soft_limit
    }

    pub fn fixed_conn(&self) -> bool {
        self.fixed_conn
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn candidate_pool(&self) -> CandidatePool {
        self.candidate_pool
    }

    pub fn on_infeasible(&self) -> InfeasiblePolicy {
        self.on_infeasible
    }

    /// Number of rewirable layers this config describes.
    pub fn num_layers(&self) -> usize {
        self.connectivity_proportion.len()
    }

    /// Sparsity label used in result file names.
    ///
    /// Fixed-connectivity runs share the `sparse_hard` label.
    pub fn mode_name(&self) -> &'static str {
        if self.soft_limit {
            "sparse_soft"
        } else {
            "sparse_hard"
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.connectivity_proportion.is_empty() {
            return Err(RewireError::EmptyProportions);
        }
        for (index, &value) in self.connectivity_proportion.iter().enumerate() {
            if !(value > 0.0 && value <= 1.0) {
                return Err(RewireError::InvalidProportion { index, value });
            }
        }
        Ok(())
    }

    /// Validate against concrete `(rows, cols)` layer shapes: one shape per
    /// proportion, and each proportion reachable exactly on its layer.
    pub fn validate_shapes(&self, shapes: &[(usize, usize)]) -> Result<()> {
        self.validate()?;
        if shapes.len() != self.num_layers() {
            return Err(RewireError::LayerCountMismatch {
                expected: self.num_layers(),
                found: shapes.len(),
            });
        }
        let pairs = shapes.iter().zip(&self.connectivity_proportion);
        for (i, (&(rows, cols), &p)) in pairs.enumerate() {
            let size = rows * cols;
            if !is_realizable(p, size) {
                return Err(RewireError::UnrealizableProportion {
                    layer: format!("layer {i} ({rows}x{cols})"),
                    proportion: p,
                    size,
                    nearest: expected_active(p, size) as f64 / size.max(1) as f64,
                });
            }
        }
        Ok(())
    }
}

fn default_asserts_on() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults_to_hard_rewiring() {
        let config = RewiringConfig::new(vec![0.1, 0.2]);
        assert!(config.asserts_on());
        assert!(!config.soft_limit());
        assert!(!config.fixed_conn());
        assert_eq!(config.seed(), None);
        assert_eq!(config.candidate_pool(), CandidatePool::PreviouslyInactive);
        assert_eq!(config.on_infeasible(), InfeasiblePolicy::Fail);
        assert_eq!(config.num_layers(), 2);
        assert_eq!(config.mode_name(), "sparse_hard");
    }

    #[test]
    fn test_builders() {
        let config = RewiringConfig::new(vec![0.5])
            .with_soft_limit(true)
            .with_seed(9)
            .with_candidate_pool(CandidatePool::AllInactive)
            .with_infeasible_policy(InfeasiblePolicy::Clamp);
        assert!(config.soft_limit());
        assert_eq!(config.seed(), Some(9));
        assert_eq!(config.candidate_pool(), CandidatePool::AllInactive);
        assert_eq!(config.on_infeasible(), InfeasiblePolicy::Clamp);
        assert_eq!(config.mode_name(), "sparse_soft");
        assert_eq!(config.with_soft_limit(false).with_fixed_conn(true).mode_name(), "sparse_hard");
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(matches!(
            RewiringConfig::new(vec![]).validate(),
            Err(RewireError::EmptyProportions)
        ));
        assert!(matches!(
            RewiringConfig::new(vec![0.3, 0.0]).validate(),
            Err(RewireError::InvalidProportion { index: 1, .. })
        ));
        assert!(matches!(
            RewiringConfig::new(vec![1.01]).validate(),
            Err(RewireError::InvalidProportion { index: 0, .. })
        ));
        assert!(RewiringConfig::new(vec![1.0, 0.01]).validate().is_ok());
    }

    #[test]
    fn test_validate_shapes() {
        let config = RewiringConfig::new(vec![0.1, 0.25]);
        assert!(config.validate_shapes(&[(20, 10), (10, 4)]).is_ok());
        assert!(matches!(
            config.validate_shapes(&[(20, 10)]),
            Err(RewireError::LayerCountMismatch {
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            RewiringConfig::new(vec![0.3333]).validate_shapes(&[(10, 10)]),
            Err(RewireError::UnrealizableProportion { size: 100, .. })
        ));
    }

    #[test]
    fn test_from_yaml_minimal() {
        let config = RewiringConfig::from_yaml_str("connectivity_proportion: [0.01, 0.03, 0.3]\n")
            .unwrap();
        assert_eq!(config.connectivity_proportion(), &[0.01, 0.03, 0.3]);
        assert!(!config.fixed_conn());
        assert!(config.asserts_on());
    }

    #[test]
    fn test_from_yaml_full() {
        let yaml = r"
connectivity_proportion: [0.1]
asserts_on: false
soft_limit: true
fixed_conn: true
seed: 1234
candidate_pool: all_inactive
on_infeasible: clamp
";
        let config = RewiringConfig::from_yaml_str(yaml).unwrap();
        assert!(!config.asserts_on());
        assert!(config.soft_limit());
        assert!(config.fixed_conn());
        assert_eq!(config.seed(), Some(1234));
        assert_eq!(config.candidate_pool(), CandidatePool::AllInactive);
        assert_eq!(config.on_infeasible(), InfeasiblePolicy::Clamp);
    }

    #[test]
    fn test_from_yaml_invalid_is_rejected() {
        assert!(matches!(
            RewiringConfig::from_yaml_str("connectivity_proportion: [2.0]"),
            Err(RewireError::InvalidProportion { .. })
        ));
        assert!(matches!(
            RewiringConfig::from_yaml_str("soft_limit: true"),
            Err(RewireError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rewire.yaml");
        std::fs::write(&path, "connectivity_proportion: [0.25]\nseed: 3\n").unwrap();
        let config = RewiringConfig::load(&path).unwrap();
        assert_eq!(config.seed(), Some(3));

        let missing = RewiringConfig::load(dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(RewireError::Io { .. })));
    }
}
