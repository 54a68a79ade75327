//! # seekline
//!
//! Random-access line reads over large text files, backed by a prebuilt
//! binary offset index. Indexing a file once makes any line or line range
//! retrievable in two seeks and one bounded read — no scanning from the
//! top, regardless of file size.
//!
//! ## How it works
//!
//! - **Build**: the file is split into fixed-size byte chunks which a pool
//!   of workers (one per core) scans in parallel for line terminators,
//!   each writing a partial index of chunk-relative offsets. Work is
//!   handed out through a pull queue, so uneven chunks balance themselves
//!   across cores.
//! - **Merge**: once every worker is done, the partials are concatenated
//!   in chunk order into `<file>.index`, rewriting each offset to be
//!   absolute in the source file. Publication is atomic: either a complete
//!   index appears, or none does.
//! - **Read**: record *i* of the index is the start offset of line *i+1*,
//!   stored as a 5-byte big-endian integer (files up to 1 TiB). Two
//!   adjacent records bound any line; two records bound any range.
//!
//! The index assumes the source is not modified after it is built, and is
//! reused as a cache on subsequent runs.
//!
//! ## Quick start
//!
//! ```no_run
//! use seekline::{LineReader, build_index};
//!
//! fn main() -> seekline::Result<()> {
//!     // One-time build (a no-op if `big.log.index` already exists).
//!     build_index("big.log")?;
//!
//!     // Reads are seek-based; no scanning.
//!     let mut reader = LineReader::open("big.log")?;
//!     println!("{} lines", reader.line_count());
//!     let line = reader.read_line(42)?;
//!     let span = reader.read_lines(100, 110)?;
//!     println!("{line}\n---\n{span}");
//!     Ok(())
//! }
//! ```
//!
//! Construction and reads are configurable through [`IndexOptions`] (chunk
//! size, worker count) and [`ReadOptions`] (trailing-terminator handling);
//! see [`IndexBuilder`] and [`LineReader::open_with`].

/// Driving parallel index construction.
pub mod builder;
/// Splitting files into worker-sized byte ranges.
pub mod chunk;
/// The 5-byte offset record format.
pub mod codec;
pub mod error;
/// Merging partial indexes into the master index.
mod merge;
/// Index-backed line reads.
pub mod reader;
/// Chunk scanning workers and the orchestrator protocol.
mod worker;

pub use builder::{BuildOutcome, IndexBuilder, IndexOptions, build_index, index_path};
pub use chunk::DEFAULT_CHUNK_SIZE;
pub use codec::{MAX_OFFSET, RECORD_WIDTH};
pub use error::{Error, Result};
pub use reader::{LineReader, ReadOptions};
