//! Random-access line reads backed by the master index.
//!
//! A read costs two seeks and one bounded read, independent of file size:
//! one 5- or 10-byte read from the index to find the byte span, one read of
//! exactly that span from the source. No scanning ever happens at query
//! time.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use log::debug;

use crate::builder::{IndexBuilder, IndexOptions, index_path};
use crate::codec::{self, RECORD_WIDTH};
use crate::error::{Error, Result};

/// Configuration for line reads.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReadOptions {
    /// Keep the trailing `\n` on returned lines. Off by default. The last
    /// line of a file with no final terminator is returned whole either
    /// way.
    pub include_trailing_terminator: bool,
}

/// A session over one source file and its master index.
///
/// Owns its own read-only handles for both files for its whole lifetime;
/// nothing here is shared or cached process-wide. Opening a reader for a
/// file with no index builds one first.
#[derive(Debug)]
pub struct LineReader {
    source: File,
    source_path: PathBuf,
    index: File,
    index_path: PathBuf,
    max_line: u64,
    options: ReadOptions,
}

impl LineReader {
    /// Open `source` for indexed reads, building the index with default
    /// options if it is missing or empty.
    pub fn open(source: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(source, ReadOptions::default(), IndexOptions::default())
    }

    /// Open `source` with explicit read and (if a build is needed) index
    /// options.
    pub fn open_with(
        source: impl AsRef<Path>,
        options: ReadOptions,
        index_options: IndexOptions,
    ) -> Result<Self> {
        let source_path = source.as_ref().to_path_buf();
        let idx_path = index_path(&source_path);

        // Build on demand; a no-op when a non-empty index already exists.
        IndexBuilder::new(index_options).build(&source_path)?;

        let source = File::open(&source_path).map_err(|e| Error::open(&source_path, e))?;
        let index = File::open(&idx_path).map_err(|e| Error::open(&idx_path, e))?;

        let index_len = index
            .metadata()
            .map_err(|e| Error::io(&idx_path, e))?
            .len();
        if index_len == 0 || !codec::is_aligned(index_len) {
            return Err(Error::CorruptIndex {
                path: idx_path,
                reason: format!("{index_len} bytes is not a whole number of records"),
            });
        }

        let max_line = index_len / RECORD_WIDTH as u64 - 1;
        debug!(
            "opened {} ({max_line} lines via {})",
            source_path.display(),
            idx_path.display()
        );

        Ok(Self {
            source,
            source_path,
            index,
            index_path: idx_path,
            max_line,
            options,
        })
    }

    /// Highest readable line number (1-based). Zero for an empty file.
    pub fn max_line(&self) -> u64 {
        self.max_line
    }

    /// Number of lines in the file; same value as [`max_line`](Self::max_line).
    pub fn line_count(&self) -> u64 {
        self.max_line
    }

    /// Read line `line` (1-based) as a `String`.
    ///
    /// # Errors
    /// [`Error::Range`] unless `1 <= line <= max_line`; [`Error::Utf8`] if
    /// the line is not valid UTF-8.
    pub fn read_line(&mut self, line: u64) -> Result<String> {
        let mut buf = Vec::new();
        self.read_line_raw(line, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    /// Read line `line` (1-based) as raw bytes into `buf`, returning the
    /// number of bytes appended.
    pub fn read_line_raw(&mut self, line: u64, buf: &mut Vec<u8>) -> Result<usize> {
        if line < 1 || line > self.max_line {
            return Err(Error::Range {
                from: line,
                to: line,
                max_line: self.max_line,
            });
        }

        // Record i holds the start of line i+1, so records (line-1) and
        // line bound the requested line; one 10-byte read covers both.
        let mut records = [0u8; 2 * RECORD_WIDTH];
        self.read_index_at((line - 1) * RECORD_WIDTH as u64, &mut records)?;
        let start = codec::decode(&records[..RECORD_WIDTH]);
        let end = codec::decode(&records[RECORD_WIDTH..]);

        self.read_span(start, end, buf)
    }

    /// Read lines `from..=to` (1-based, `from < to`) as one `String`,
    /// interior terminators intact.
    ///
    /// The span is fetched with a single contiguous read of the source
    /// rather than line by line.
    pub fn read_lines(&mut self, from: u64, to: u64) -> Result<String> {
        let mut buf = Vec::new();
        self.read_lines_raw(from, to, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    /// Raw-bytes variant of [`read_lines`](Self::read_lines).
    pub fn read_lines_raw(&mut self, from: u64, to: u64, buf: &mut Vec<u8>) -> Result<usize> {
        if from < 1 || from >= to || to > self.max_line {
            return Err(Error::Range {
                from,
                to,
                max_line: self.max_line,
            });
        }

        let mut rec = [0u8; RECORD_WIDTH];
        self.read_index_at((from - 1) * RECORD_WIDTH as u64, &mut rec)?;
        let start = codec::decode(&rec);
        self.read_index_at(to * RECORD_WIDTH as u64, &mut rec)?;
        let end = codec::decode(&rec);

        self.read_span(start, end, buf)
    }

    fn read_index_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.index
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.index.read_exact(buf))
            .map_err(|e| Error::io(&self.index_path, e))
    }

    /// Read `[start, end)` from the source into `buf`, trimming the
    /// trailing terminator unless configured otherwise.
    fn read_span(&mut self, start: u64, end: u64, buf: &mut Vec<u8>) -> Result<usize> {
        // Records are strictly increasing in a well-formed index; going
        // backwards means the index bytes cannot be trusted.
        if start >= end {
            return Err(Error::CorruptIndex {
                path: self.index_path.clone(),
                reason: format!("records out of order ({start} >= {end})"),
            });
        }

        let prev = buf.len();
        buf.resize(prev + (end - start) as usize, 0);
        self.source
            .seek(SeekFrom::Start(start))
            .and_then(|_| self.source.read_exact(&mut buf[prev..]))
            .map_err(|e| Error::io(&self.source_path, e))?;

        // Pop the terminator only if one is actually there; the last line
        // of a terminator-less file keeps its final byte.
        if !self.options.include_trailing_terminator && buf.last() == Some(&b'\n') {
            buf.pop();
        }
        Ok(buf.len() - prev)
    }
}
