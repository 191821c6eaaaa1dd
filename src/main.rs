//! Recablear CLI
//!
//! # Usage
//!
//! ```bash
//! # Validate a rewiring config
//! recablear validate rewire.yaml
//!
//! # Run the rewiring hooks on synthetic LeNet-300-100 shaped layers
//! recablear simulate rewire.yaml --layer 784x300 --layer 300x100 --layer 100x10 \
//!     --epochs 5 --steps 100 --output-dir results/
//! ```

use clap::Parser;
use recablear::cli::{run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
