//! Logging setup for CLI output

use tracing_subscriber::EnvFilter;

/// Log level for CLI output
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    /// Errors only
    Quiet,
    /// Epoch reports and warnings
    Normal,
    /// Per-batch rewiring events as well
    Verbose,
}

impl LogLevel {
    /// Pick a level from the `--verbose` / `--quiet` flags
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Default filter directive for this level
    pub fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "info",
            Self::Verbose => "debug",
        }
    }
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the level.
pub fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.directive()));
    // Already installed (e.g. tests calling twice) is fine.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        assert_eq!(LogLevel::from_flags(false, false), LogLevel::Normal);
        assert_eq!(LogLevel::from_flags(true, false), LogLevel::Verbose);
        assert_eq!(LogLevel::from_flags(true, true), LogLevel::Quiet);
    }

    #[test]
    fn test_directive() {
        assert_eq!(LogLevel::Quiet.directive(), "error");
        assert_eq!(LogLevel::Verbose.directive(), "debug");
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_tracing(LogLevel::Quiet);
        init_tracing(LogLevel::Normal);
    }
}
