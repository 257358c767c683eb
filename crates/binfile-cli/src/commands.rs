//! Command implementations.

use anyhow::{Context, Result};
use binfile_format::{BinFile, Header, OpenMode};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::Command;
use crate::error::CliError;

/// Header fields plus the derived sizes `info` reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    /// File that was inspected
    pub path: PathBuf,
    /// Parsed header
    #[serde(flatten)]
    pub header: Header,
    /// Header size in bytes
    pub header_size: u64,
    /// Size of one sample in bytes
    pub sample_size: u64,
    /// Length on disk
    pub file_len: u64,
}

/// Outcome of `verify`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// Parsed header
    pub header: Header,
    /// Length implied by the header
    pub expected_len: u64,
    /// Length on disk
    pub actual_len: u64,
    /// Whole samples present after the header
    pub complete_samples: u64,
    /// Bytes after the last whole sample
    pub trailing_bytes: u64,
}

impl VerifyReport {
    /// Whether the file is exactly as long as its header says
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.expected_len == self.actual_len
    }
}

/// Run a command, writing its report to `out`.
///
/// # Errors
///
/// Returns an error if a file cannot be opened or parsed, if a sample is
/// rejected by the destination, or if `verify` finds an inconsistent file.
pub fn run<W: Write>(command: &Command, out: &mut W) -> Result<()> {
    match command {
        Command::Info { path, json } => info_cmd(path, *json, out),
        Command::Dump { path, index, limit } => dump_cmd(path, *index, *limit, out),
        Command::Append { dest, sources } => append_cmd(dest, sources, out),
        Command::Verify { path } => verify_cmd(path, out),
    }
}

/// Read the header of `path` and compute its derived sizes.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or its header is invalid.
pub fn summarize(path: &Path) -> Result<FileSummary> {
    let file = BinFile::open(path, OpenMode::IN)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let header = file
        .header()
        .cloned()
        .with_context(|| format!("{} has no header", path.display()))?;
    let file_len = std::fs::metadata(path)?.len();

    Ok(FileSummary {
        path: path.to_path_buf(),
        header_size: header.size(),
        sample_size: header.sample_size(),
        file_len,
        header,
    })
}

/// Compare the on-disk length of `path` with what its header describes.
///
/// Only the header is parsed, so files with a short tail can still be
/// reported on.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or its header is invalid.
pub fn verify(path: &Path) -> Result<VerifyReport> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let actual_len = file.metadata()?.len();
    let header = Header::read(&mut BufReader::new(file))
        .with_context(|| format!("failed to parse header of {}", path.display()))?;

    let body = actual_len.saturating_sub(header.size());
    let sample_size = header.sample_size();
    let (complete_samples, trailing_bytes) = if sample_size == 0 {
        (header.sample_count, body)
    } else {
        (body / sample_size, body % sample_size)
    };

    Ok(VerifyReport {
        expected_len: header.expected_file_len(),
        actual_len,
        complete_samples,
        trailing_bytes,
        header,
    })
}

fn info_cmd<W: Write>(path: &Path, json: bool, out: &mut W) -> Result<()> {
    let summary = summarize(path)?;
    if json {
        serde_json::to_writer_pretty(&mut *out, &summary)?;
        writeln!(out)?;
        return Ok(());
    }

    let header = &summary.header;
    writeln!(out, "File:         {}", summary.path.display())?;
    writeln!(out, "Element type: {}", header.element_type)?;
    writeln!(out, "Element size: {} bytes", header.element_size)?;
    writeln!(out, "Rank:         {}", header.rank())?;
    writeln!(out, "Extents:      {:?}", header.extents)?;
    writeln!(out, "Samples:      {}", header.sample_count)?;
    writeln!(out, "Header size:  {} bytes", summary.header_size)?;
    writeln!(out, "Sample size:  {} bytes", summary.sample_size)?;
    writeln!(out, "File size:    {} bytes", summary.file_len)?;
    Ok(())
}

fn dump_cmd<W: Write>(
    path: &Path,
    index: Option<u64>,
    limit: Option<u64>,
    out: &mut W,
) -> Result<()> {
    let mut file = BinFile::open(path, OpenMode::IN)
        .with_context(|| format!("failed to open {}", path.display()))?;

    if let Some(index) = index {
        let sample = file
            .read_at(index)
            .with_context(|| format!("failed to read sample {index}"))?;
        writeln!(out, "[{index}] {sample}")?;
        return Ok(());
    }

    let limit = limit.unwrap_or(u64::MAX);
    for (i, sample) in (0..limit).zip(file.samples()) {
        let sample = sample.with_context(|| format!("failed to read sample {i}"))?;
        writeln!(out, "[{i}] {sample}")?;
    }
    Ok(())
}

fn append_cmd<W: Write>(dest: &Path, sources: &[PathBuf], out: &mut W) -> Result<()> {
    let mut target = BinFile::open(dest, OpenMode::OUT | OpenMode::APPEND)
        .with_context(|| format!("failed to open {} for append", dest.display()))?;
    let before = target.len();

    for source in sources {
        let mut input = BinFile::open(source, OpenMode::IN)
            .with_context(|| format!("failed to open {}", source.display()))?;
        let mut copied = 0u64;
        for sample in input.samples() {
            let sample =
                sample.with_context(|| format!("failed to read {}", source.display()))?;
            target.write(&sample).with_context(|| {
                format!(
                    "{} is not compatible with {}",
                    source.display(),
                    dest.display()
                )
            })?;
            copied += 1;
        }
        debug!(source = %source.display(), copied, "copied samples");
    }

    let appended = target.len() - before;
    let total = target.len();
    target.close()?;
    info!(dest = %dest.display(), appended, total, "append finished");
    writeln!(out, "Appended {appended} samples to {} ({total} total)", dest.display())?;
    Ok(())
}

fn verify_cmd<W: Write>(path: &Path, out: &mut W) -> Result<()> {
    let report = verify(path)?;
    writeln!(out, "Header samples:   {}", report.header.sample_count)?;
    writeln!(out, "Complete samples: {}", report.complete_samples)?;
    writeln!(out, "Trailing bytes:   {}", report.trailing_bytes)?;
    writeln!(out, "Expected length:  {}", report.expected_len)?;
    writeln!(out, "Actual length:    {}", report.actual_len)?;

    if !report.is_consistent() {
        return Err(CliError::Inconsistent {
            path: path.to_path_buf(),
            expected: report.expected_len,
            actual: report.actual_len,
        }
        .into());
    }
    writeln!(out, "OK")?;
    Ok(())
}
