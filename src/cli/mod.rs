//! CLI module for recablear
//!
//! This module contains argument parsing, logging setup and the command
//! handlers.

mod args;
mod commands;
mod logging;

pub use args::{parse_args, parse_layer_spec, Cli, Command, SimulateArgs, ValidateArgs};
pub use commands::{format_config_info, result_file_stem, run_command, run_simulate, run_validate};
pub use logging::{init_tracing, LogLevel};
