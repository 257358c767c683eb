//! `binfile` entry point.
//!
//! Parses arguments, installs logging on stderr, and runs the selected
//! command against stdout.

use anyhow::Result;
use binfile_cli::{CliConfig, run};

fn main() -> Result<()> {
    let config = CliConfig::from_args();

    tracing_subscriber::fmt()
        .with_env_filter(config.env_filter()?)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(command = ?config.command, "starting");

    let stdout = std::io::stdout();
    run(&config.command, &mut stdout.lock())
}
