//! CLI command implementations

mod simulate;
mod validate;

use crate::cli::{init_tracing, Cli, Command, LogLevel};
use crate::error::Result;

pub use simulate::{result_file_stem, run_simulate};
pub use validate::{format_config_info, run_validate};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<()> {
    init_tracing(LogLevel::from_flags(cli.verbose, cli.quiet));

    match cli.command {
        Command::Validate(args) => run_validate(&args),
        Command::Simulate(args) => run_simulate(&args).map(|_| ()),
    }
}
