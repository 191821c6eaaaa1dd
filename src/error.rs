//! Error types for rewiring
//!
//! Invariant violations are fatal: the controller returns them immediately and
//! the host training loop is expected to abort the run.

use std::path::PathBuf;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, RewireError>;

/// Errors raised by layers, the rewiring controller and configuration loading
#[derive(Debug, thiserror::Error)]
pub enum RewireError {
    #[error(
        "Layer '{layer}': pruned connection ({row}, {col}) carries weight {value} (must be 0.0)"
    )]
    PrunedWeightNonZero {
        layer: String,
        row: usize,
        col: usize,
        value: f32,
    },

    #[error(
        "Layer '{layer}': connectivity drifted to {actual} ({active}/{size} active), expected {expected}"
    )]
    ConnectivityDrift {
        layer: String,
        expected: f64,
        actual: f64,
        active: usize,
        size: usize,
    },

    #[error("Layer '{layer}': mask was modified outside the rewiring step ({changed} entries differ)")]
    MaskMutated { layer: String, changed: usize },

    #[error(
        "Layer '{layer}': cannot rewire {required} connections, only {available} candidates are inactive"
    )]
    SamplingInfeasible {
        layer: String,
        required: usize,
        available: usize,
    },

    #[error("Expected {expected} rewirable layers (one per connectivity proportion), found {found}")]
    LayerCountMismatch { expected: usize, found: usize },

    #[error("Snapshot does not match layer '{layer}': {reason}")]
    SnapshotMismatch { layer: String, reason: String },

    #[error("Kernel shape {kernel:?} does not match mask shape {mask:?}")]
    ShapeMismatch {
        kernel: (usize, usize),
        mask: (usize, usize),
    },

    #[error(
        "Layer '{layer}': proportion {proportion} is not reachable with {size} connections (nearest is {nearest})"
    )]
    UnrealizableProportion {
        layer: String,
        proportion: f64,
        size: usize,
        nearest: f64,
    },

    #[error("Invalid connectivity proportion at index {index}: {value} (must be in (0.0, 1.0])")]
    InvalidProportion { index: usize, value: f64 },

    #[error("Connectivity proportion list cannot be empty")]
    EmptyProportions,

    #[error("Invalid layer spec '{0}' (expected ROWSxCOLS, e.g. 784x300)")]
    InvalidLayerSpec(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RewireError {
    /// Whether this error is a broken training invariant (as opposed to a
    /// wiring or configuration problem)
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::PrunedWeightNonZero { .. }
                | Self::ConnectivityDrift { .. }
                | Self::MaskMutated { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pruned_weight_message_names_position() {
        let err = RewireError::PrunedWeightNonZero {
            layer: "dense_1".into(),
            row: 3,
            col: 7,
            value: 0.25,
        };
        let msg = err.to_string();
        assert!(msg.contains("dense_1"));
        assert!(msg.contains("(3, 7)"));
        assert!(msg.contains("0.25"));
    }

    #[test]
    fn test_invariant_classification() {
        assert!(RewireError::MaskMutated {
            layer: "a".into(),
            changed: 1
        }
        .is_invariant_violation());
        assert!(!RewireError::SamplingInfeasible {
            layer: "a".into(),
            required: 4,
            available: 2
        }
        .is_invariant_violation());
        assert!(!RewireError::EmptyProportions.is_invariant_violation());
    }

    #[test]
    fn test_unrealizable_message_shows_nearest() {
        let err = RewireError::UnrealizableProportion {
            layer: "dense_1".into(),
            proportion: 0.305,
            size: 100,
            nearest: 0.31,
        };
        let msg = err.to_string();
        assert!(msg.contains("0.305"));
        assert!(msg.contains("nearest is 0.31"));
    }

    #[test]
    fn test_io_error_mentions_path() {
        let err = RewireError::io(
            "/tmp/missing.yaml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().contains("missing.yaml"));
    }
}
