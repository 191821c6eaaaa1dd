//! Validate command implementation

use crate::cli::ValidateArgs;
use crate::error::Result;
use crate::rewire::RewiringConfig;
use tracing::info;

/// Format a configuration summary as a string
pub fn format_config_info(config: &RewiringConfig) -> String {
    let mut lines = vec![format!("  Mode: {}", config.mode_name())];
    if config.fixed_conn() {
        lines.push("  Rewiring: disabled (fixed connectivity)".to_string());
    }
    if !config.asserts_on() {
        lines.push("  Invariant checks: off".to_string());
    }
    for (i, p) in config.connectivity_proportion().iter().enumerate() {
        lines.push(format!("  Layer {i}: {:.1}% connectivity", p * 100.0));
    }
    lines.push(format!("  Candidate pool: {:?}", config.candidate_pool()));
    lines.push(format!("  On infeasible: {:?}", config.on_infeasible()));
    if let Some(seed) = config.seed() {
        lines.push(format!("  Seed: {seed}"));
    }
    lines.join("\n")
}

/// Load a config file, validate it and log a summary
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let config = RewiringConfig::load(&args.config)?;
    info!(
        "Configuration {} is valid\n{}",
        args.config.display(),
        format_config_info(&config)
    );
    Ok(())
}
