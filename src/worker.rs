//! Chunk workers: scan one byte range for line boundaries and write one
//! partial index file.
//!
//! Workers share no state. Each one opens its own read-only handle on the
//! source, pulls chunks from the orchestrator over a channel, and writes
//! offsets measured from the start of its chunk — translating them to
//! file-absolute offsets is the merger's job.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender};

use log::debug;

use crate::chunk::Chunk;
use crate::codec;
use crate::error::{Error, Result};

/// Orchestrator → worker. A worker that has signalled readiness either gets
/// the next chunk off the queue or is told to stop.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Assignment {
    Chunk(Chunk),
    Shutdown,
}

/// Worker → orchestrator.
#[derive(Debug)]
pub(crate) enum WorkerEvent {
    /// "I am idle, give me work or tell me to stop." Sent once at startup
    /// with `completed: None`, then after each finished chunk with the part
    /// number the worker just wrote.
    Ready {
        worker: usize,
        completed: Option<u64>,
    },
    /// Fatal error; the worker exits after sending this and the whole run
    /// aborts.
    Failed { worker: usize, error: Error },
}

/// Scan a chunk buffer for line terminators.
///
/// Returns chunk-relative line-start boundaries: a terminator at buffer
/// index `k` yields `k + 1`, the first byte of the following line.
/// Terminators are assumed normalized to single-byte `\n` upstream.
pub(crate) fn scan_chunk(buf: &[u8]) -> Vec<u64> {
    memchr::memchr_iter(b'\n', buf)
        .map(|k| k as u64 + 1)
        .collect()
}

/// Name of the partial index file for `part`, e.g. `access.log.index.000007`.
///
/// The part number is zero-padded so a lexical directory listing matches
/// numeric part order; the merger still sorts by the parsed number.
pub(crate) fn partial_path(scratch: &Path, source: &Path, part: u64) -> PathBuf {
    let base = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "source".to_string());
    scratch.join(format!("{base}.index.{part:06}"))
}

/// Process one chunk: read exactly `end - start` bytes at `start`, scan for
/// boundaries, encode, and write the partial index file.
fn process_chunk(
    source: &mut File,
    source_path: &Path,
    scratch: &Path,
    chunk: Chunk,
) -> Result<()> {
    let mut buf = vec![0u8; chunk.len() as usize];
    source
        .seek(SeekFrom::Start(chunk.start))
        .and_then(|_| source.read_exact(&mut buf))
        .map_err(|e| Error::io(source_path, e))?;

    let mut boundaries = scan_chunk(&buf);
    if chunk.part == 1 {
        // Line 1 starts at offset 0; the leading record is stored
        // explicitly so record i is always the start of line i+1.
        boundaries.insert(0, 0);
    }

    let encoded = codec::encode_all(&boundaries)?;
    let path = partial_path(scratch, source_path, chunk.part);
    std::fs::write(&path, &encoded).map_err(|e| Error::io(&path, e))?;

    debug!(
        "chunk {} done: {} boundaries -> {}",
        chunk.part,
        boundaries.len(),
        path.display()
    );
    Ok(())
}

/// Worker loop: announce readiness, then process assignments until told to
/// stop. Every partial file is fully written before the next `Ready` goes
/// out, so the orchestrator's drain doubles as a write barrier.
pub(crate) fn run(
    id: usize,
    source_path: &Path,
    scratch: &Path,
    assignments: Receiver<Assignment>,
    events: Sender<WorkerEvent>,
) {
    let mut source = match File::open(source_path) {
        Ok(f) => f,
        Err(e) => {
            let _ = events.send(WorkerEvent::Failed {
                worker: id,
                error: Error::open(source_path, e),
            });
            return;
        }
    };

    debug!("worker {id} ready");
    if events
        .send(WorkerEvent::Ready {
            worker: id,
            completed: None,
        })
        .is_err()
    {
        return;
    }

    loop {
        match assignments.recv() {
            Ok(Assignment::Chunk(chunk)) => {
                match process_chunk(&mut source, source_path, scratch, chunk) {
                    Ok(()) => {
                        let sent = events.send(WorkerEvent::Ready {
                            worker: id,
                            completed: Some(chunk.part),
                        });
                        if sent.is_err() {
                            return;
                        }
                    }
                    Err(error) => {
                        let _ = events.send(WorkerEvent::Failed { worker: id, error });
                        return;
                    }
                }
            }
            // Shutdown, or the orchestrator dropped its end after a failure.
            Ok(Assignment::Shutdown) | Err(_) => {
                debug!("worker {id} shutting down");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_finds_boundaries_after_terminators() {
        assert_eq!(scan_chunk(b"a\nbb\nccc\n"), vec![2, 5, 9]);
    }

    #[test]
    fn scan_without_trailing_terminator() {
        assert_eq!(scan_chunk(b"x\ny"), vec![2]);
    }

    #[test]
    fn scan_empty_and_terminator_only() {
        assert_eq!(scan_chunk(b""), Vec::<u64>::new());
        assert_eq!(scan_chunk(b"\n\n"), vec![1, 2]);
    }

    #[test]
    fn partial_name_is_zero_padded() {
        let p = partial_path(Path::new("/tmp/scratch"), Path::new("/data/big.log"), 12);
        assert_eq!(p, Path::new("/tmp/scratch/big.log.index.000012"));
    }
}
