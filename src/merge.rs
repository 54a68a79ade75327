//! Merging per-chunk partial indexes into the master index.
//!
//! Runs in a single pass after every worker has exited. Each partial file
//! holds chunk-relative offsets; the merger rewrites them to file-absolute
//! offsets by adding a running correction that advances by the *nominal*
//! chunk size per partial — workers measured their offsets against a buffer
//! of exactly that many bytes (except the final chunk, after which no
//! correction is applied), so the fix-up stays purely additive.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::chunk::ChunkPlan;
use crate::codec::{self, RECORD_WIDTH};
use crate::error::{Error, Result};

/// One discovered partial index file.
struct Partial {
    part: u64,
    path: PathBuf,
}

/// List the partial index files in the scratch directory.
///
/// The scratch directory is exclusively owned by the run, so every entry in
/// it is a partial. Globbing `<scratch>/*` rather than a pattern built from
/// the source name keeps basenames containing glob metacharacters (say,
/// `log[1].txt`) working.
fn list_partials(scratch: &Path) -> Result<Vec<Partial>> {
    let pattern = scratch.join("*");

    let mut partials = Vec::new();
    let entries = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| Error::io(scratch, std::io::Error::other(e)))?;
    for entry in entries {
        let path = entry.map_err(|e| Error::io(scratch, e.into_error()))?;
        let part = path
            .extension()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<u64>().ok());
        match part {
            Some(part) => partials.push(Partial { part, path }),
            // Anything unparsable in our own scratch dir means the run is
            // not trustworthy.
            None => {
                return Err(Error::CorruptIndex {
                    path,
                    reason: "unexpected file in scratch directory".to_string(),
                });
            }
        }
    }
    partials.sort_by_key(|p| p.part);
    Ok(partials)
}

/// Merge all partial indexes into the master index at `dest`.
///
/// The master is written to `<dest>.tmp` and renamed into place only once
/// every record is out, so a failed merge never publishes a half-built
/// index. Returns the number of usable lines in the finished index.
///
/// # Errors
/// [`Error::MissingPartial`] if the partials are not exactly parts
/// `1..=chunks`, [`Error::CorruptIndex`] if any partial's size is not a
/// whole number of records.
pub(crate) fn merge_partials(scratch: &Path, plan: &ChunkPlan, dest: &Path) -> Result<u64> {
    let partials = list_partials(scratch)?;
    for (i, p) in partials.iter().enumerate() {
        if p.part != i as u64 + 1 {
            return Err(Error::MissingPartial { part: i as u64 + 1 });
        }
    }
    if partials.len() < plan.chunks.len() {
        return Err(Error::MissingPartial {
            part: partials.len() as u64 + 1,
        });
    }

    let tmp = tmp_path(dest);
    let out = fs::File::create(&tmp).map_err(|e| Error::io(&tmp, e))?;
    let mut out = BufWriter::new(out);

    let mut master_offset = 0u64;
    let mut records = 0u64;
    let mut last_record = None;

    for partial in &partials {
        debug!("merging {}", partial.path.display());
        let data = fs::read(&partial.path).map_err(|e| Error::io(&partial.path, e))?;
        if !codec::is_aligned(data.len() as u64) {
            return Err(Error::CorruptIndex {
                path: partial.path.clone(),
                reason: format!("{} bytes is not a whole number of records", data.len()),
            });
        }
        for rec in data.chunks_exact(RECORD_WIDTH) {
            let absolute = codec::decode(rec) + master_offset;
            out.write_all(&codec::encode(absolute)?)
                .map_err(|e| Error::io(&tmp, e))?;
            last_record = Some(absolute);
            records += 1;
        }
        master_offset += plan.chunk_size;
    }

    // Empty source: the single end-of-file record doubles as line 1's start.
    if partials.is_empty() {
        out.write_all(&codec::encode(0)?)
            .map_err(|e| Error::io(&tmp, e))?;
        last_record = Some(0);
        records += 1;
    }

    // Files not ending in a terminator never produced their final boundary;
    // synthesize it so the last line's length is always computable.
    if last_record != Some(plan.file_size) {
        out.write_all(&codec::encode(plan.file_size)?)
            .map_err(|e| Error::io(&tmp, e))?;
        records += 1;
    }

    out.flush().map_err(|e| Error::io(&tmp, e))?;
    drop(out);
    fs::rename(&tmp, dest).map_err(|e| Error::io(dest, e))?;

    let lines = records - 1;
    info!(
        "merged {} partial indexes into {} ({lines} lines)",
        partials.len(),
        dest.display()
    );
    Ok(lines)
}

fn tmp_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
