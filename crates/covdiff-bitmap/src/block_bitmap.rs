use std::collections::BTreeSet;

use crate::error::BitmapError;

/// Identifier of an instrumented basic block: its bit position in the
/// block bitmap.
pub type BlockId = u32;

/// Set of covered basic blocks, in ascending id order.
pub type BlockSet = BTreeSet<BlockId>;

/// Largest block bitmap whose bit positions all fit in a [`BlockId`].
/// 2^29 bytes × 8 bits = 2^32 positions.
const MAX_BLOCK_BYTES: usize = 1 << 29;

/// Decode a bit-packed block bitmap into the set of covered block ids.
///
/// Bit `b` (LSB = 0) of byte `i` describes block `i * 8 + b`. A set bit
/// means the block executed at least once during the run.
///
/// ```text
///   byte 0       byte 1
///   7......0     7......0
///   00000101     10000000
///        │ │     │
///        │ └─ 0  └─ 15
///        └─── 2
/// ```
///
/// Any length is accepted; an empty buffer is an empty set. Pin the length
/// with [`BitmapShape`](crate::BitmapShape) to reject truncated files.
///
/// # Errors
///
/// [`BitmapError::TooLarge`] if a bit position would not fit in a `u32`.
pub fn decode_blocks(buf: &[u8]) -> Result<BlockSet, BitmapError> {
    check_block_len(buf)?;
    Ok(set_bits(buf).collect())
}

/// Number of covered blocks in a bitmap, without building the set.
///
/// # Errors
///
/// Same as [`decode_blocks`].
pub fn count_blocks(buf: &[u8]) -> Result<usize, BitmapError> {
    check_block_len(buf)?;
    Ok(buf.iter().map(|b| b.count_ones() as usize).sum())
}

fn check_block_len(buf: &[u8]) -> Result<(), BitmapError> {
    if buf.len() > MAX_BLOCK_BYTES {
        return Err(BitmapError::TooLarge {
            map: "block",
            len: buf.len(),
        });
    }
    Ok(())
}

/// Iterate the absolute positions of all set bits, ascending.
///
/// Callers must have checked the length against [`MAX_BLOCK_BYTES`], which
/// makes the `u32` arithmetic below lossless.
#[allow(clippy::cast_possible_truncation)]
fn set_bits(buf: &[u8]) -> impl Iterator<Item = BlockId> + '_ {
    buf.iter()
        .enumerate()
        .filter(|(_, byte)| **byte != 0)
        .flat_map(|(index, &byte)| {
            let base = (index as u32) * 8;
            let mut remaining = byte;
            std::iter::from_fn(move || {
                if remaining == 0 {
                    return None;
                }
                let bit = remaining.trailing_zeros();
                // Clear the lowest set bit
                remaining &= remaining - 1;
                Some(base + bit)
            })
        })
}
