//! Command-line configuration.
//!
//! Options can be given as arguments or, for the log level, through the
//! `BINFILE_LOG` environment variable. `RUST_LOG` takes precedence over both
//! when set.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::error::CliError;

/// Default log filter when neither `RUST_LOG` nor `--log-level` is set
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Top-level configuration parsed from arguments and environment.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "binfile",
    about = "Inspect and maintain BinFile array containers",
    version
)]
pub struct CliConfig {
    /// Log filter (e.g. `info`, `binfile_format=debug`)
    #[arg(
        long,
        global = true,
        env = "BINFILE_LOG",
        default_value = DEFAULT_LOG_LEVEL
    )]
    pub log_level: String,

    /// Operation to perform
    #[command(subcommand)]
    pub command: Command,
}

/// Available operations.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the header of a file
    Info {
        /// File to inspect
        path: PathBuf,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print samples
    Dump {
        /// File to read
        path: PathBuf,
        /// Print only the sample at this index
        #[arg(long, conflicts_with = "limit")]
        index: Option<u64>,
        /// Stop after this many samples
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Append every sample of the sources to the destination
    Append {
        /// File to extend, created when missing
        dest: PathBuf,
        /// Files whose samples are copied, in order
        #[arg(required = true)]
        sources: Vec<PathBuf>,
    },

    /// Check that the file length matches its header
    Verify {
        /// File to check
        path: PathBuf,
    },
}

impl CliConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Build the log filter, preferring `RUST_LOG` when it is set.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::InvalidLogLevel`] if `--log-level` is not a valid
    /// filter directive.
    pub fn env_filter(&self) -> Result<EnvFilter, CliError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.log_level).map_err(|e| CliError::InvalidLogLevel {
            level: self.log_level.clone(),
            reason: e.to_string(),
        })
    }
}
