//! Error types for BinFile reading and writing

use crate::element::ElementType;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while opening a file
#[derive(Debug, Error)]
pub enum OpenError {
    /// The file could not be opened or its header could not be parsed
    #[error("Cannot read BinFile {path}: {source}")]
    CannotRead {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: Box<BinFileError>,
    },

    /// The requested combination of mode flags is not supported
    #[error("Invalid open flags: {0}")]
    InvalidFlags(&'static str),

    /// The string form of an open mode contained an unsupported character
    #[error(
        "Unsupported mode character '{0}': use 'r' (read), 'w' (write) or 'a'/'+' (append)"
    )]
    InvalidModeString(char),
}

/// Errors raised while decoding the on-disk header
#[derive(Debug, Error)]
pub enum FormatError {
    /// The stream ended before the header or a sample was complete
    #[error("Truncated data: stream ended early")]
    Truncated,

    /// The element type tag is not a known element type
    #[error("Invalid element type tag: {0}")]
    InvalidType(u32),

    /// The stored rank is outside 1..=4
    #[error("Invalid rank {0}: must be between 1 and 4")]
    InvalidRank(u32),

    /// The stored element size disagrees with the element type
    #[error("Element size mismatch for {element_type}: expected {expected} bytes, header says {actual}")]
    ElementSizeMismatch {
        /// Element type from the header
        element_type: ElementType,
        /// Byte width of that element type
        expected: u32,
        /// Byte width stored in the header
        actual: u32,
    },

    /// The product of the extents does not fit in 64 bits
    #[error("Sample size overflows: extents {0:?}")]
    SampleSizeOverflow(Vec<u64>),

    /// Any other binary decoding failure
    #[error("Malformed header: {0}")]
    Malformed(String),
}

/// Errors raised when an operation is not valid in the current session state
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    /// No header has been read or written yet
    #[error("No header has been initialized for this file")]
    Uninitialized,

    /// Samples were already written, so the header is fixed
    #[error("Cannot initialize the header after samples have been written")]
    AlreadyWritten,

    /// The file was not opened for reading
    #[error("File was not opened for reading")]
    NotReadable,

    /// The file was not opened for writing
    #[error("File was not opened for writing")]
    NotWritable,

    /// The file has already been closed
    #[error("File is closed")]
    Closed,
}

/// Errors that can occur while working with a BinFile
#[derive(Debug, Error)]
pub enum BinFileError {
    /// Opening the file failed
    #[error(transparent)]
    Open(#[from] OpenError),

    /// The on-disk data is not a valid BinFile
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The operation is not valid in the current state
    #[error(transparent)]
    State(#[from] StateError),

    /// A rank or extent does not match the file's shape
    #[error("Dimension mismatch: found {found}, expected {expected}")]
    Dimension {
        /// Rank or extent of the offending array
        found: usize,
        /// Rank or extent required by the file
        expected: usize,
    },

    /// The element type does not match the file's element type
    #[error("Element type mismatch: found {found}, expected {expected}")]
    Type {
        /// Element type that was supplied or requested
        found: ElementType,
        /// Element type stored in the file
        expected: ElementType,
    },

    /// The sample index is past the last sample
    #[error("Sample index {index} is out of range")]
    Index {
        /// Requested sample index
        index: u64,
    },

    /// The decoded elements did not fit the header shape
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Underlying I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<binrw::Error> for BinFileError {
    fn from(e: binrw::Error) -> Self {
        match e {
            binrw::Error::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                Self::Format(FormatError::Truncated)
            }
            binrw::Error::Io(io) => Self::Io(io),
            other => Self::Format(FormatError::Malformed(other.to_string())),
        }
    }
}

/// Result type alias for BinFile operations
pub type Result<T> = std::result::Result<T, BinFileError>;

/// Map a short read onto [`FormatError::Truncated`], keeping other I/O errors.
pub(crate) fn map_eof(e: std::io::Error) -> BinFileError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        FormatError::Truncated.into()
    } else {
        e.into()
    }
}
