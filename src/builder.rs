//! The orchestrator: drives parallel index construction end to end.
//!
//! Scheduling is a pull-based work queue. Workers signal readiness; the
//! orchestrator hands whichever worker asks next the next chunk off a FIFO
//! queue, or a shutdown once the queue drains. Uneven chunk cost therefore
//! balances itself across cores with no static partitioning. The merge runs
//! strictly after every worker has exited.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use log::{debug, info};

use crate::chunk::{self, DEFAULT_CHUNK_SIZE};
use crate::error::{Error, Result};
use crate::merge;
use crate::worker::{self, Assignment, WorkerEvent};

/// Configuration for index construction.
#[derive(Clone, Copy, Debug)]
pub struct IndexOptions {
    /// Nominal chunk size in bytes. Must be a positive even number. Also
    /// bounds each worker's buffer, so it doubles as a memory ceiling.
    pub chunk_size: u64,
    /// Worker count; `None` means one per available core.
    pub workers: Option<usize>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers: None,
        }
    }
}

/// Result of a [`IndexBuilder::build`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildOutcome {
    /// A fresh master index was built and published.
    Built { lines: u64, chunks: usize },
    /// A non-empty master index already existed; nothing was done. The
    /// index is treated as a cache — no staleness check against the source
    /// is performed.
    AlreadyIndexed,
}

/// Builds the master index for a source file.
#[derive(Clone, Copy, Debug, Default)]
pub struct IndexBuilder {
    pub options: IndexOptions,
}

impl IndexBuilder {
    pub fn new(options: IndexOptions) -> Self {
        Self { options }
    }

    /// Build the master index for `source`, publishing it at
    /// [`index_path`]`(source)`.
    ///
    /// Idempotent: returns [`BuildOutcome::AlreadyIndexed`] without touching
    /// anything if a non-empty index is already in place. All-or-nothing
    /// otherwise: any worker failure aborts the run and no index is
    /// published.
    pub fn build(&self, source: impl AsRef<Path>) -> Result<BuildOutcome> {
        let source = source.as_ref();
        let dest = index_path(source);

        if fs::metadata(&dest).map(|m| m.len() > 0).unwrap_or(false) {
            debug!("{} already indexed", source.display());
            return Ok(BuildOutcome::AlreadyIndexed);
        }

        let file_size = fs::metadata(source)
            .map_err(|e| Error::open(source, e))?
            .len();
        let plan = chunk::plan(file_size, self.options.chunk_size)?;

        // Empty source: no chunks, no workers; publish the lone
        // end-of-file record through the same merge path.
        if plan.chunks.is_empty() {
            let scratch = self.scratch_dir()?;
            merge::merge_partials(scratch.path(), &plan, &dest)?;
            return Ok(BuildOutcome::Built { lines: 0, chunks: 0 });
        }

        let workers = self
            .options
            .workers
            .unwrap_or_else(num_cpus::get)
            .max(1)
            .min(plan.chunks.len());
        info!(
            "indexing {} ({file_size} bytes, {} chunks, {workers} workers)",
            source.display(),
            plan.chunks.len()
        );

        let scratch = self.scratch_dir()?;
        self.run_workers(source, scratch.path(), &plan, workers)?;

        let lines = merge::merge_partials(scratch.path(), &plan, &dest)?;
        Ok(BuildOutcome::Built {
            lines,
            chunks: plan.chunks.len(),
        })
    }

    /// Scratch directory for partial index files; removed on drop, so a
    /// failed run cleans up after itself.
    fn scratch_dir(&self) -> Result<tempfile::TempDir> {
        tempfile::Builder::new()
            .prefix("seekline-")
            .tempdir()
            .map_err(|e| Error::io(std::env::temp_dir(), e))
    }

    /// Run the worker pool over the chunk queue and wait for every worker
    /// to exit. Returns only once all partial files are written and closed,
    /// which is the barrier the merge relies on.
    fn run_workers(
        &self,
        source: &Path,
        scratch: &Path,
        plan: &chunk::ChunkPlan,
        workers: usize,
    ) -> Result<()> {
        let mut queue: VecDeque<_> = plan.chunks.iter().copied().collect();
        let (event_tx, event_rx) = mpsc::channel::<WorkerEvent>();

        thread::scope(|scope| {
            let mut assignment_txs = Vec::with_capacity(workers);
            for id in 0..workers {
                let (tx, rx) = mpsc::channel::<Assignment>();
                assignment_txs.push(tx);
                let events = event_tx.clone();
                scope.spawn(move || worker::run(id, source, scratch, rx, events));
            }
            // Only workers hold senders now, so the loop below observes a
            // disconnect once every worker is gone.
            drop(event_tx);

            let mut stopped = 0usize;
            let mut failure: Option<Error> = None;

            while stopped < workers {
                match event_rx.recv() {
                    Ok(WorkerEvent::Ready { worker, completed }) => {
                        if let Some(part) = completed {
                            debug!("worker {worker} finished chunk {part}");
                        }
                        let next = if failure.is_none() {
                            queue.pop_front().map(Assignment::Chunk)
                        } else {
                            None
                        };
                        let msg = next.unwrap_or(Assignment::Shutdown);
                        if matches!(msg, Assignment::Shutdown) {
                            stopped += 1;
                        }
                        if assignment_txs[worker].send(msg).is_err() && failure.is_none() {
                            failure = Some(Error::Worker {
                                id: worker,
                                source: Box::new(Error::io(
                                    source,
                                    std::io::Error::other("worker hung up"),
                                )),
                            });
                        }
                    }
                    Ok(WorkerEvent::Failed { worker, error }) => {
                        stopped += 1;
                        if failure.is_none() {
                            failure = Some(Error::Worker {
                                id: worker,
                                source: Box::new(error),
                            });
                        }
                    }
                    // All senders dropped: every worker has exited.
                    Err(_) => break,
                }
            }

            match failure {
                Some(err) => Err(err),
                None => Ok(()),
            }
        })
    }
}

/// Path of the master index for `source`: the source path with `.index`
/// appended.
pub fn index_path(source: impl AsRef<Path>) -> PathBuf {
    let mut name = source.as_ref().as_os_str().to_owned();
    name.push(".index");
    PathBuf::from(name)
}

/// Build an index for `source` with default options.
///
/// Convenience wrapper over [`IndexBuilder`].
pub fn build_index(source: impl AsRef<Path>) -> Result<BuildOutcome> {
    IndexBuilder::default().build(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_path_appends_extension() {
        assert_eq!(
            index_path("/var/log/app.log"),
            PathBuf::from("/var/log/app.log.index")
        );
    }

    #[test]
    fn missing_source_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_index(dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
