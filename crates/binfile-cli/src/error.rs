//! Error types for the command-line front end.

use std::path::PathBuf;
use thiserror::Error;

/// Failures detected by the commands themselves.
///
/// Library failures pass through as [`binfile_format::BinFileError`].
#[derive(Debug, Error)]
pub enum CliError {
    /// Log filter directive could not be parsed
    #[error("invalid log level '{level}': {reason}")]
    InvalidLogLevel {
        /// Directive as given
        level: String,
        /// Parser message
        reason: String,
    },

    /// File length disagrees with its header
    #[error("{path}: file is {actual} bytes, header describes {expected}")]
    Inconsistent {
        /// File that failed verification
        path: PathBuf,
        /// Length implied by the header
        expected: u64,
        /// Length on disk
        actual: u64,
    },
}
