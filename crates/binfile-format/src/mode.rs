//! Open mode flags
//!
//! A mode is a combination of [`OpenMode::IN`], [`OpenMode::OUT`] and
//! [`OpenMode::APPEND`]. The string form accepts `r`, `w` and `a`/`+`:
//!
//! ```
//! use binfile_format::OpenMode;
//!
//! let mode: OpenMode = "wa".parse().unwrap();
//! assert_eq!(mode, OpenMode::OUT | OpenMode::APPEND);
//! ```

use crate::error::OpenError;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

/// Set of open mode flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OpenMode(u8);

impl OpenMode {
    /// No flags set
    pub const NONE: Self = Self(0);
    /// Open for reading
    pub const IN: Self = Self(0x01);
    /// Open for writing
    pub const OUT: Self = Self(0x02);
    /// Position writes after existing samples
    pub const APPEND: Self = Self(0x04);

    /// Create from raw flag bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x07)
    }

    /// Raw flag bits
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check whether all flags in `other` are set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether reads are permitted
    pub const fn is_readable(self) -> bool {
        self.contains(Self::IN)
    }

    /// Whether writes are permitted
    pub const fn is_writable(self) -> bool {
        self.contains(Self::OUT)
    }

    /// Whether append is requested
    pub const fn is_append(self) -> bool {
        self.contains(Self::APPEND)
    }

    /// Resolve the access level, rejecting unsupported combinations
    pub fn access(self) -> Result<Access, OpenError> {
        match (self.is_readable(), self.is_writable()) {
            (true, true) => Ok(Access::ReadWrite),
            (false, true) => Ok(Access::WriteOnly),
            (true, false) if self.is_append() => Err(OpenError::InvalidFlags(
                "cannot append in read-only mode",
            )),
            (true, false) => Ok(Access::ReadOnly),
            (false, false) => Err(OpenError::InvalidFlags(
                "mode must include read or write",
            )),
        }
    }
}

impl BitOr for OpenMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for OpenMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl FromStr for OpenMode {
    type Err = OpenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mode = Self::NONE;
        for c in s.chars() {
            mode |= match c {
                'r' => Self::IN,
                'w' => Self::OUT,
                'a' | '+' => Self::APPEND,
                other => return Err(OpenError::InvalidModeString(other)),
            };
        }
        Ok(mode)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_readable() {
            f.write_str("r")?;
        }
        if self.is_writable() {
            f.write_str("w")?;
        }
        if self.is_append() {
            f.write_str("a")?;
        }
        Ok(())
    }
}

/// Access level a file was opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Reads only
    ReadOnly,
    /// Writes only
    WriteOnly,
    /// Reads and writes
    ReadWrite,
}
