//! Fixed-width encoding of byte offsets.
//!
//! Every offset in an index file — partial or master — is stored as a 5-byte
//! unsigned big-endian integer. Five bytes address files up to 2^40 - 1 bytes
//! (1 TiB) at 5/8 the cost of a naive `u64` per line, which is what makes the
//! index cheap enough to keep next to multi-gigabyte logs.

use crate::error::{Error, Result};

/// Width in bytes of one offset record.
pub const RECORD_WIDTH: usize = 5;

/// Largest byte offset a record can hold.
pub const MAX_OFFSET: u64 = (1 << 40) - 1;

/// Encode a byte offset into one record.
pub fn encode(offset: u64) -> Result<[u8; RECORD_WIDTH]> {
    if offset > MAX_OFFSET {
        return Err(Error::OffsetOverflow(offset));
    }
    let be = offset.to_be_bytes();
    let mut rec = [0u8; RECORD_WIDTH];
    rec.copy_from_slice(&be[8 - RECORD_WIDTH..]);
    Ok(rec)
}

/// Decode one record back into a byte offset.
///
/// # Panics
/// Panics if `rec` is shorter than [`RECORD_WIDTH`]; callers always hand in
/// exact-width slices from `chunks_exact`.
pub fn decode(rec: &[u8]) -> u64 {
    let mut be = [0u8; 8];
    be[8 - RECORD_WIDTH..].copy_from_slice(&rec[..RECORD_WIDTH]);
    u64::from_be_bytes(be)
}

/// Encode a slice of offsets into a contiguous record buffer.
pub fn encode_all(offsets: &[u64]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(offsets.len() * RECORD_WIDTH);
    for &offset in offsets {
        out.extend_from_slice(&encode(offset)?);
    }
    Ok(out)
}

/// Check that `len` holds a whole number of records.
pub fn is_aligned(len: u64) -> bool {
    len % RECORD_WIDTH as u64 == 0
}
