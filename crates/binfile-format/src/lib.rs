//! Reader and writer for the legacy BinFile array container
//!
//! A BinFile stores a sequence of same-typed, same-shaped arrays
//! ("samples") behind a small header:
//!
//! - Element type tag, element size, rank (1-4), extents, sample count
//! - All fields and elements in native byte order
//! - Samples stored back to back in row-major order
//!
//! The format is deprecated and kept for compatibility with existing data.
//!
//! # Modules
//!
//! - [`header`]: header codec and sample offset arithmetic
//! - [`element`]: element types and their byte codecs
//! - [`sample`]: the typed array wrapper used for reads and writes
//! - [`file`]: the [`BinFile`] engine with its open-mode state machine
//!
//! # Example
//!
//! ```rust,no_run
//! use binfile_format::{BinFile, OpenMode, Sample};
//! use binfile_format::ndarray::array;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut file = BinFile::open("grid.bin", OpenMode::OUT | OpenMode::APPEND)?;
//! file.write(&Sample::from(array![[0u8, 1], [2, 3]]))?;
//! println!("{} samples", file.len());
//! # Ok(())
//! # }
//! ```

#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::float_cmp)] // Exact float round-trips are the point
#![allow(clippy::use_self)] // Type clarity
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod element;
pub mod error;
pub mod extended;
pub mod file;
pub mod header;
pub mod mode;
pub mod sample;

pub use element::{Element, ElementType};
pub use error::{BinFileError, FormatError, OpenError, Result, StateError};
pub use extended::Extended;
pub use file::{BinFile, Samples};
pub use header::{Header, sample_byte_offset};
pub use mode::{Access, OpenMode};
pub use sample::{MAX_RANK, Sample};

// Re-exported for callers building samples
pub use ndarray;
pub use num_complex;
