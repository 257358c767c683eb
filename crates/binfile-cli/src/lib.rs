//! Command-line tooling for BinFile containers.
//!
//! The binary in `bin/binfile.rs` is a thin wrapper: it parses
//! [`CliConfig`], installs logging, and hands the selected [`Command`] to
//! [`run`]. Every command writes its report to a caller-supplied writer so
//! it can be driven from tests without spawning a process.
//!
//! # Example
//!
//! ```no_run
//! use binfile_cli::{CliConfig, run};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = CliConfig::from_args();
//!     run(&config.command, &mut std::io::stdout().lock())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod commands;
pub mod config;
pub mod error;

pub use commands::{FileSummary, VerifyReport, run, summarize, verify};
pub use config::{CliConfig, Command};
pub use error::CliError;
