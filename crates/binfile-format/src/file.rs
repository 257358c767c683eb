//! BinFile reader and writer
//!
//! A [`BinFile`] owns the file handle and the session state for one open
//! file. The first sample written fixes the element type and shape; every
//! later sample must match it. Samples are addressed by index, and the
//! sample count in the header is rewritten when the file is closed.
//!
//! # Example
//!
//! ```rust,no_run
//! use binfile_format::{BinFile, OpenMode, Sample};
//! use binfile_format::ndarray::array;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut out = BinFile::open("data.bin", OpenMode::OUT)?;
//! out.write(&Sample::from(array![[1.0f64, 2.0], [3.0, 4.0], [5.0, 6.0]]))?;
//! out.write(&Sample::from(array![[7.0f64, 8.0], [9.0, 10.0], [11.0, 12.0]]))?;
//! out.close()?;
//!
//! let mut input = BinFile::open("data.bin", OpenMode::IN)?;
//! assert_eq!(input.len(), 2);
//! let second = input.read_array::<f64>(1)?;
//! assert_eq!(second[[2, 1]], 12.0);
//! # Ok(())
//! # }
//! ```

use crate::element::{Element, ElementType};
use crate::error::{BinFileError, FormatError, OpenError, Result, StateError, map_eof};
use crate::header::Header;
use crate::mode::{Access, OpenMode};
use crate::sample::{MAX_RANK, Sample};
use ndarray::ArrayD;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Mutable state of one open session
#[derive(Debug, Default, Clone)]
struct Session {
    /// Header once read from disk or written by the first sample
    header: Option<Header>,
    /// Index of the sample the next read or write touches
    cursor: u64,
    /// Number of samples the file holds in this session
    written: u64,
}

impl Session {
    fn from_header(header: Header, append: bool) -> Self {
        let count = header.sample_count;
        Self {
            header: Some(header),
            cursor: if append { count } else { 0 },
            written: count,
        }
    }
}

/// Open BinFile with its cursor and sample bookkeeping
#[derive(Debug)]
pub struct BinFile {
    path: PathBuf,
    file: Option<File>,
    mode: OpenMode,
    access: Access,
    session: Session,
}

impl BinFile {
    /// Open `path` with the given mode flags
    ///
    /// Unsupported flag combinations are rejected before the filesystem is
    /// touched.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        let access = mode.access()?;

        let (file, session) = match access {
            Access::ReadOnly => {
                let mut file = File::open(path).map_err(|e| cannot_read(path, e.into()))?;
                let header = Header::read(&mut file).map_err(|e| cannot_read(path, e))?;
                (file, Session::from_header(header, false))
            }
            Access::WriteOnly if !mode.is_append() => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)?;
                (file, Session::default())
            }
            Access::WriteOnly | Access::ReadWrite => {
                let mut file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(false)
                    .open(path)?;
                let session = if file.metadata()?.len() > 0 {
                    let header = Header::read(&mut file).map_err(|e| cannot_read(path, e))?;
                    Session::from_header(header, mode.is_append())
                } else {
                    Session::default()
                };
                (file, session)
            }
        };

        info!(
            "Opened {} ({:?}, {} samples)",
            path.display(),
            access,
            session.written
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            mode,
            access,
            session,
        })
    }

    /// Create or truncate `path` for writing
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, OpenMode::OUT)
    }

    /// Open `path` using the string form of the mode, e.g. `"r"` or `"wa"`
    pub fn open_str(path: impl AsRef<Path>, mode: &str) -> Result<Self> {
        Self::open(path, mode.parse()?)
    }

    /// Path the file was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mode flags the file was opened with
    pub const fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Access level derived from the mode flags
    pub const fn access(&self) -> Access {
        self.access
    }

    /// Whether the file has not been closed yet
    pub const fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Header of the file, if one has been read or written
    pub fn header(&self) -> Option<&Header> {
        self.session.header.as_ref()
    }

    /// Element type of the samples, if known
    pub fn element_type(&self) -> Option<ElementType> {
        self.header().map(|h| h.element_type)
    }

    /// Extents of every sample, if known
    pub fn extents(&self) -> Option<&[u64]> {
        self.header().map(|h| h.extents.as_slice())
    }

    /// Number of samples in the file, including this session's writes
    pub const fn len(&self) -> u64 {
        self.session.written
    }

    /// Whether the file holds no samples
    pub const fn is_empty(&self) -> bool {
        self.session.written == 0
    }

    /// Index of the sample the next `read` or `write` uses
    pub const fn position(&self) -> u64 {
        self.session.cursor
    }

    /// Write the header for samples of the given type and shape
    ///
    /// Only allowed before any sample exists. The first [`write`](Self::write)
    /// calls this implicitly.
    pub fn init_header(&mut self, element_type: ElementType, extents: &[usize]) -> Result<()> {
        self.ensure_writable()?;
        if self.session.written > 0 {
            return Err(StateError::AlreadyWritten.into());
        }
        check_rank(extents.len())?;

        let header = Header::new(element_type, extents, 0);
        let file = self.file.as_mut().ok_or(StateError::Closed)?;
        file.seek(SeekFrom::Start(0))?;
        header.write(file)?;
        file.set_len(header.size())?;

        debug!(
            "Initialized header for {}: {} {:?}",
            self.path.display(),
            element_type,
            extents
        );
        self.session.header = Some(header);
        self.session.cursor = 0;
        Ok(())
    }

    /// Write `sample` at the cursor and advance it
    ///
    /// The first sample defines the element type and shape of the file.
    /// Later samples are checked against them before any byte is written.
    pub fn write(&mut self, sample: &Sample) -> Result<()> {
        self.ensure_writable()?;

        match &self.session.header {
            None => self.init_header(sample.element_type(), sample.extents())?,
            Some(header) => check_compatible(header, sample)?,
        }

        let (offset, bytes) = match &self.session.header {
            Some(header) => (
                header.sample_byte_offset(self.session.cursor),
                sample.to_bytes(),
            ),
            None => return Err(StateError::Uninitialized.into()),
        };

        let file = self.file.as_mut().ok_or(StateError::Closed)?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&bytes)?;

        self.session.cursor += 1;
        if self.session.cursor > self.session.written {
            self.session.written += 1;
        }
        debug!(
            "Wrote sample {} to {}",
            self.session.cursor - 1,
            self.path.display()
        );
        Ok(())
    }

    /// Read the sample at the cursor and advance it by one
    pub fn read(&mut self) -> Result<Sample> {
        self.ensure_readable()?;
        let header = self
            .session
            .header
            .as_ref()
            .ok_or(StateError::Uninitialized)?;

        let index = self.session.cursor;
        if index >= self.session.written {
            return Err(BinFileError::Index { index });
        }

        let file = self.file.as_mut().ok_or(StateError::Closed)?;
        let sample_size = header.sample_size();

        // Check the data exists before sizing a buffer from the header
        let (offset, end) = index
            .checked_mul(sample_size)
            .and_then(|skip| skip.checked_add(header.size()))
            .and_then(|offset| Some((offset, offset.checked_add(sample_size)?)))
            .ok_or(FormatError::Truncated)?;
        if end > file.metadata()?.len() {
            return Err(FormatError::Truncated.into());
        }
        let len = usize::try_from(sample_size)
            .map_err(|_| FormatError::SampleSizeOverflow(header.extents.clone()))?;

        let mut bytes = vec![0u8; len];
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut bytes).map_err(map_eof)?;

        let sample = Sample::from_bytes(header.element_type, &header.shape(), &bytes)?;
        self.session.cursor += 1;
        Ok(sample)
    }

    /// Read sample `index`; the cursor ends up just past it
    pub fn read_at(&mut self, index: u64) -> Result<Sample> {
        self.ensure_readable()?;
        if self.session.header.is_none() {
            return Err(StateError::Uninitialized.into());
        }
        if index >= self.session.written {
            return Err(BinFileError::Index { index });
        }
        self.session.cursor = index;
        self.read()
    }

    /// Read sample `index` as an array of element type `T`
    pub fn read_array<T: Element>(&mut self, index: u64) -> Result<ArrayD<T>> {
        if let Some(stored) = self.element_type()
            && stored != T::TYPE
        {
            return Err(BinFileError::Type {
                found: T::TYPE,
                expected: stored,
            });
        }
        self.read_at(index)?.into_array()
    }

    /// Move the cursor to sample `index`
    ///
    /// `index` may equal [`len`](Self::len) to continue appending. Writing
    /// at an existing index replaces that sample in place without changing
    /// the sample count.
    pub fn seek(&mut self, index: u64) -> Result<()> {
        if self.file.is_none() {
            return Err(StateError::Closed.into());
        }
        if index > self.session.written {
            return Err(BinFileError::Index { index });
        }
        self.session.cursor = index;
        Ok(())
    }

    /// Iterate over all samples from the first one
    pub fn samples(&mut self) -> Samples<'_> {
        Samples {
            file: self,
            next: 0,
        }
    }

    /// Rewrite the sample count and release the file handle
    ///
    /// Closing an already closed file does nothing.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };

        if self.mode.is_writable()
            && let Some(header) = self.session.header.as_mut()
        {
            header.sample_count = self.session.written;
            header.write_sample_count(&mut file)?;
            file.flush()?;
        }

        info!(
            "Closed {} ({} samples)",
            self.path.display(),
            self.session.written
        );
        Ok(())
    }

    fn ensure_readable(&self) -> Result<()> {
        if self.file.is_none() {
            return Err(StateError::Closed.into());
        }
        if !self.mode.is_readable() {
            return Err(StateError::NotReadable.into());
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.file.is_none() {
            return Err(StateError::Closed.into());
        }
        if !self.mode.is_writable() {
            return Err(StateError::NotWritable.into());
        }
        Ok(())
    }
}

impl Drop for BinFile {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close {}: {}", self.path.display(), e);
        }
    }
}

/// Iterator over the samples of a [`BinFile`]
pub struct Samples<'a> {
    file: &'a mut BinFile,
    next: u64,
}

impl Iterator for Samples<'_> {
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.file.len() {
            return None;
        }
        let item = self.file.read_at(self.next);
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.file.len().saturating_sub(self.next) as usize;
        (remaining, Some(remaining))
    }
}

fn cannot_read(path: &Path, source: BinFileError) -> BinFileError {
    OpenError::CannotRead {
        path: path.to_path_buf(),
        source: Box::new(source),
    }
    .into()
}

fn check_rank(rank: usize) -> Result<()> {
    if rank == 0 || rank > MAX_RANK {
        return Err(BinFileError::Dimension {
            found: rank,
            expected: MAX_RANK,
        });
    }
    Ok(())
}

/// Rank first, then each extent in order, then element type
fn check_compatible(header: &Header, sample: &Sample) -> Result<()> {
    if sample.rank() != header.rank() {
        return Err(BinFileError::Dimension {
            found: sample.rank(),
            expected: header.rank(),
        });
    }
    for (&found, &expected) in sample.extents().iter().zip(&header.extents) {
        if found as u64 != expected {
            return Err(BinFileError::Dimension {
                found,
                expected: expected as usize,
            });
        }
    }
    if sample.element_type() != header.element_type {
        return Err(BinFileError::Type {
            found: sample.element_type(),
            expected: header.element_type,
        });
    }
    Ok(())
}
