//! Splitting a file into byte-range chunks for the worker pool.

use crate::error::{Error, Result};

/// Nominal chunk size used when none is configured.
pub const DEFAULT_CHUNK_SIZE: u64 = 100_000;

/// One contiguous byte range of the source file, processed by a single
/// worker in one pass. `start` is inclusive, `end` exclusive. Parts are
/// 1-indexed and ascending; chunks cover `[0, file_size)` without gaps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub part: u64,
    pub start: u64,
    pub end: u64,
}

impl Chunk {
    /// Byte length of this chunk.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }
}

/// The full division of a file into chunks.
///
/// The nominal `chunk_size` is kept alongside the chunks: the merger advances
/// its correction offset by the nominal size per partial file, not by each
/// chunk's actual length, so the plan must carry it.
#[derive(Clone, Debug)]
pub struct ChunkPlan {
    pub chunks: Vec<Chunk>,
    pub chunk_size: u64,
    pub file_size: u64,
}

/// Divide `file_size` bytes into `ceil(file_size / chunk_size)` chunks.
///
/// All chunks share the nominal size except the last, which absorbs the
/// remainder. An empty file yields zero chunks; the caller special-cases it
/// by publishing the single end-of-file record directly.
///
/// # Errors
/// [`Error::InvalidChunkSize`] if `chunk_size` is zero or odd.
pub fn plan(file_size: u64, chunk_size: u64) -> Result<ChunkPlan> {
    if chunk_size == 0 || chunk_size % 2 != 0 {
        return Err(Error::InvalidChunkSize(chunk_size));
    }

    let count = file_size.div_ceil(chunk_size);
    let mut chunks = Vec::with_capacity(count as usize);
    for i in 1..=count {
        let start = (i - 1) * chunk_size;
        let end = (i * chunk_size).min(file_size);
        chunks.push(Chunk { part: i, start, end });
    }

    Ok(ChunkPlan {
        chunks,
        chunk_size,
        file_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_division() {
        let p = plan(100, 10).unwrap();
        assert_eq!(p.chunks.len(), 10);
        assert_eq!(p.chunks[0], Chunk { part: 1, start: 0, end: 10 });
        assert_eq!(p.chunks[9], Chunk { part: 10, start: 90, end: 100 });
    }

    #[test]
    fn last_chunk_absorbs_remainder() {
        let p = plan(25, 10).unwrap();
        assert_eq!(p.chunks.len(), 3);
        assert_eq!(p.chunks[2], Chunk { part: 3, start: 20, end: 25 });
        assert_eq!(p.chunks[2].len(), 5);
    }

    #[test]
    fn chunk_larger_than_file() {
        let p = plan(7, 1_000_000).unwrap();
        assert_eq!(p.chunks.len(), 1);
        assert_eq!(p.chunks[0], Chunk { part: 1, start: 0, end: 7 });
    }

    #[test]
    fn empty_file_has_no_chunks() {
        let p = plan(0, 10).unwrap();
        assert!(p.chunks.is_empty());
        assert_eq!(p.file_size, 0);
    }

    #[test]
    fn chunks_are_contiguous_and_cover_file() {
        let p = plan(1234, 100).unwrap();
        let mut expected_start = 0;
        for c in &p.chunks {
            assert_eq!(c.start, expected_start);
            expected_start = c.end;
        }
        assert_eq!(expected_start, 1234);
    }

    #[test]
    fn odd_or_zero_chunk_size_rejected() {
        assert!(matches!(plan(10, 0), Err(Error::InvalidChunkSize(0))));
        assert!(matches!(plan(10, 3), Err(Error::InvalidChunkSize(3))));
    }
}
