//! Error types for index construction and line reads.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while building or querying an index.
///
/// Failures are fail-fast: no component retries, and a failed build never
/// leaves a partial master index behind (the merger publishes via a temporary
/// path and an atomic rename).
#[derive(Debug, Error)]
pub enum Error {
    /// The source file does not exist or could not be opened.
    #[error("source file not found: {path}")]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A read, write or seek failed mid-run.
    #[error("i/o failure on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A requested line or line range lies outside `1..=max_line`, or the
    /// range bounds are not strictly increasing.
    #[error("invalid line range: from={from} to={to} (valid lines are 1..={max_line})")]
    Range { from: u64, to: u64, max_line: u64 },

    /// An index file (partial or master) failed an integrity check — a size
    /// that is not a whole number of records, or records out of order.
    /// Guessing would risk serving wrong bytes, so the operation aborts
    /// instead.
    #[error("corrupt index {path}: {reason}")]
    CorruptIndex { path: PathBuf, reason: String },

    /// The merge found a gap in the partial-index sequence. Indicates a
    /// worker exited without producing its output.
    #[error("missing partial index for chunk {part}")]
    MissingPartial { part: u64 },

    /// A worker reported a fatal error; the whole run is aborted.
    #[error("worker {id} failed")]
    Worker {
        id: usize,
        #[source]
        source: Box<Error>,
    },

    /// A byte offset does not fit in a 5-byte record. The source file is
    /// larger than the index format can address (2^40 - 1 bytes).
    #[error("offset {0} exceeds the 5-byte record range")]
    OffsetOverflow(u64),

    /// Chunk size must be a positive even number of bytes.
    #[error("invalid chunk size {0}: must be a positive even number of bytes")]
    InvalidChunkSize(u64),

    /// Line content requested as a `String` is not valid UTF-8. Use the raw
    /// read variants for binary-ish files.
    #[error("line content is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Wrap an `io::Error` with the path it happened on, mapping "no such
    /// file" on open to [`Error::NotFound`].
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound { path, source }
        } else {
            Error::Io { path, source }
        }
    }
}
