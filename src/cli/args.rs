//! CLI argument types

use crate::error::{RewireError, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Recablear: fixed-sparsity rewiring for masked dense layers
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "recablear")]
#[command(version)]
#[command(about = "DEEP-R style synaptic rewiring for sparse dense layers")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (per-batch rewiring events)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Validate a rewiring configuration file
    Validate(ValidateArgs),

    /// Run the rewiring hooks on synthetic layers with noisy gradients
    Simulate(SimulateArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,
}

/// Arguments for the simulate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct SimulateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Layer shape as INPUTSxOUTPUTS, once per rewirable layer, in order
    #[arg(short, long = "layer", value_name = "SHAPE", required = true)]
    pub layers: Vec<String>,

    /// Number of epochs
    #[arg(short, long, default_value_t = 20)]
    pub epochs: usize,

    /// Batches per epoch
    #[arg(short, long, default_value_t = 100)]
    pub steps: usize,

    /// Learning rate
    #[arg(long, default_value_t = 0.1)]
    pub lr: f32,

    /// SGD momentum
    #[arg(long, default_value_t = 0.9)]
    pub momentum: f32,

    /// Exploration noise coefficient (0 disables)
    #[arg(long, default_value_t = 0.0)]
    pub noise_coeff: f32,

    /// Standard deviation of the synthetic gradients
    #[arg(long, default_value_t = 1.0)]
    pub grad_scale: f32,

    /// Random seed for layer init and gradients
    #[arg(long)]
    pub seed: Option<u64>,

    /// Disable the post-update invariant checks
    #[arg(long)]
    pub no_asserts: bool,

    /// Model name used in result file names
    #[arg(long, default_value = "lenet_300_100")]
    pub model: String,

    /// Activation label used in result file names
    #[arg(long, default_value = "relu")]
    pub activation: String,

    /// Loss label used in result file names
    #[arg(long, default_value = "crossent")]
    pub loss: String,

    /// Replaces the `results_for_<model>` prefix of result file names
    #[arg(long)]
    pub result_filename: Option<String>,

    /// Suffix appended to result file names
    #[arg(long)]
    pub suffix: Option<String>,

    /// Directory for JSON/CSV statistics
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

/// Parse command-line arguments
pub fn parse_args<I, T>(args: I) -> std::result::Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Parse a `ROWSxCOLS` layer shape
pub fn parse_layer_spec(spec: &str) -> Result<(usize, usize)> {
    let invalid = || RewireError::InvalidLayerSpec(spec.to_string());
    let (rows, cols) = spec
        .split_once(|c: char| c == 'x' || c == 'X')
        .ok_or_else(invalid)?;
    let rows: usize = rows.trim().parse().map_err(|_| invalid())?;
    let cols: usize = cols.trim().parse().map_err(|_| invalid())?;
    if rows == 0 || cols == 0 {
        return Err(invalid());
    }
    Ok((rows, cols))
}
