//! BinFile header parsing and building
//!
//! The header is the first record of the file. All fields use native byte
//! order and there is no padding:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0x00   | 4    | Element type tag |
//! | 0x04   | 4    | Element size in bytes |
//! | 0x08   | 4    | Rank (1-4) |
//! | 0x0C   | 8 × rank | Extents |
//! | ...    | 8    | Sample count |
//!
//! Sample data follows immediately, one sample after another.

use crate::element::ElementType;
use crate::error::{BinFileError, FormatError, Result};
use crate::sample::MAX_RANK;
use binrw::{BinRead, BinWrite};
use serde::Serialize;
use std::io::{Read, Seek, SeekFrom, Write};

/// Size of the fields before the extents
pub const PREFIX_SIZE: u64 = 12;

/// Size of one extent or of the sample count field
const COUNT_FIELD_SIZE: u64 = 8;

/// Fixed-width fields preceding the extents
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
struct HeaderPrefix {
    type_tag: u32,
    element_size: u32,
    rank: u32,
}

/// Parsed BinFile header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Element type shared by all samples
    pub element_type: ElementType,
    /// Size of one element in bytes
    pub element_size: u32,
    /// Per-dimension extents, one per rank
    pub extents: Vec<u64>,
    /// Number of samples, only exact after a clean close
    pub sample_count: u64,
}

impl Header {
    /// Create a header for samples of the given type and shape
    pub fn new(element_type: ElementType, extents: &[usize], sample_count: u64) -> Self {
        Self {
            element_type,
            element_size: element_type.byte_size() as u32,
            extents: extents.iter().map(|&e| e as u64).collect(),
            sample_count,
        }
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.extents.len()
    }

    /// Extents converted to in-memory sizes
    pub fn shape(&self) -> Vec<usize> {
        self.extents.iter().map(|&e| e as usize).collect()
    }

    /// Encoded header size in bytes
    pub fn size(&self) -> u64 {
        PREFIX_SIZE + COUNT_FIELD_SIZE * self.rank() as u64 + COUNT_FIELD_SIZE
    }

    /// Number of elements in one sample
    pub fn elements_per_sample(&self) -> u64 {
        self.extents.iter().product()
    }

    /// Size of one sample in bytes
    pub fn sample_size(&self) -> u64 {
        self.elements_per_sample() * u64::from(self.element_size)
    }

    /// Byte offset of sample `index`. The index is not range checked.
    ///
    /// Offsets past `u64::MAX` saturate, so they never match a real file.
    pub fn sample_byte_offset(&self, index: u64) -> u64 {
        self.size().saturating_add(index.saturating_mul(self.sample_size()))
    }

    /// Byte offset of the sample count field
    pub fn sample_count_offset(&self) -> u64 {
        self.size() - COUNT_FIELD_SIZE
    }

    /// File length implied by the header and its sample count
    pub fn expected_file_len(&self) -> u64 {
        self.sample_byte_offset(self.sample_count)
    }

    /// Validate field consistency
    pub fn validate(&self) -> Result<()> {
        let rank = self.rank();
        if rank == 0 || rank > MAX_RANK {
            return Err(FormatError::InvalidRank(rank as u32).into());
        }

        let expected = self.element_type.byte_size() as u32;
        if self.element_size != expected {
            return Err(FormatError::ElementSizeMismatch {
                element_type: self.element_type,
                expected,
                actual: self.element_size,
            }
            .into());
        }

        self.extents
            .iter()
            .try_fold(u64::from(self.element_size), |acc, &e| acc.checked_mul(e))
            .ok_or_else(|| FormatError::SampleSizeOverflow(self.extents.clone()))?;

        Ok(())
    }

    /// Parse a header from the current stream position
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let prefix = HeaderPrefix::read_ne(reader)?;

        let element_type = ElementType::try_from(prefix.type_tag)?;
        if prefix.rank == 0 || prefix.rank as usize > MAX_RANK {
            return Err(FormatError::InvalidRank(prefix.rank).into());
        }

        let mut extents = Vec::with_capacity(prefix.rank as usize);
        for _ in 0..prefix.rank {
            extents.push(u64::read_ne(reader)?);
        }
        let sample_count = u64::read_ne(reader)?;

        let header = Self {
            element_type,
            element_size: prefix.element_size,
            extents,
            sample_count,
        };
        header.validate()?;
        Ok(header)
    }

    /// Serialize the header at the current stream position
    pub fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        let prefix = HeaderPrefix {
            type_tag: self.element_type.tag(),
            element_size: self.element_size,
            rank: self.rank() as u32,
        };
        prefix.write_ne(writer)?;
        self.extents.write_ne(writer)?;
        self.sample_count.write_ne(writer)?;
        Ok(())
    }

    /// Overwrite only the sample count field of a header at offset 0
    pub fn write_sample_count<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        writer.seek(SeekFrom::Start(self.sample_count_offset()))?;
        writer
            .write_all(&self.sample_count.to_ne_bytes())
            .map_err(BinFileError::from)
    }
}

/// Byte offset of sample `index` in a file described by `header`
pub fn sample_byte_offset(header: &Header, index: u64) -> u64 {
    header.sample_byte_offset(index)
}
