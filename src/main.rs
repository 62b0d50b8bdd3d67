//! Trip planner CLI entry point.

use std::io::Write;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use trip_planner::cli::{Cli, execute};

fn setup_logging(verbose: bool) {
    let default = if verbose { "trip_planner=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout carries command output; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let output = execute(&cli)?;
    if !output.is_empty() {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "{output}")?;
        if !output.ends_with('\n') {
            writeln!(stdout)?;
        }
    }
    Ok(())
}
