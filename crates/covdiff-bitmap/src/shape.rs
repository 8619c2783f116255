use crate::block_bitmap::decode_blocks;
use crate::edge_map::decode_edges;
use crate::error::BitmapError;
use crate::{BlockSet, EdgeSet};

/// Expected byte lengths of the two bitmaps produced by one binary.
///
/// The instrumentation allocates both buffers at fixed sizes, so every run
/// of the same binary must produce buffers of the same length. Declaring
/// the shape up front turns a truncated or foreign file into a
/// [`BitmapError::LengthMismatch`] instead of a silently smaller set.
///
/// A field left as `None` accepts any length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BitmapShape {
    pub block_bytes: Option<usize>,
    pub edge_bytes: Option<usize>,
}

impl BitmapShape {
    /// Shape with both lengths pinned.
    #[must_use]
    pub fn new(block_bytes: usize, edge_bytes: usize) -> Self {
        Self {
            block_bytes: Some(block_bytes),
            edge_bytes: Some(edge_bytes),
        }
    }

    /// Check the block bitmap length, then decode it.
    ///
    /// # Errors
    ///
    /// [`BitmapError::LengthMismatch`] on a length mismatch, otherwise any
    /// error from [`decode_blocks`].
    pub fn decode_blocks(&self, buf: &[u8]) -> Result<BlockSet, BitmapError> {
        check("block", self.block_bytes, buf.len())?;
        decode_blocks(buf)
    }

    /// Check the edge map length, then decode it.
    ///
    /// # Errors
    ///
    /// [`BitmapError::LengthMismatch`] on a length mismatch, otherwise any
    /// error from [`decode_edges`].
    pub fn decode_edges(&self, buf: &[u8]) -> Result<EdgeSet, BitmapError> {
        check("edge", self.edge_bytes, buf.len())?;
        decode_edges(buf)
    }
}

fn check(map: &'static str, expected: Option<usize>, found: usize) -> Result<(), BitmapError> {
    match expected {
        Some(expected) if expected != found => Err(BitmapError::LengthMismatch {
            map,
            expected,
            found,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconstrained_shape_accepts_any_length() {
        let shape = BitmapShape::default();
        assert_eq!(shape.decode_blocks(&[0x01, 0x00, 0x80]).unwrap().len(), 2);
    }

    #[test]
    fn pinned_block_length_rejects_truncated_buffer() {
        let shape = BitmapShape::new(4, 8);
        assert_eq!(
            shape.decode_blocks(&[0xFF; 3]),
            Err(BitmapError::LengthMismatch {
                map: "block",
                expected: 4,
                found: 3
            })
        );
    }

    #[test]
    fn pinned_edge_length_rejects_oversized_buffer() {
        let shape = BitmapShape::new(4, 8);
        assert!(matches!(
            shape.decode_edges(&[0xFF; 16]),
            Err(BitmapError::LengthMismatch {
                expected: 8,
                found: 16,
                ..
            })
        ));
    }

    #[test]
    fn pinned_lengths_decode_when_matching() {
        let shape = BitmapShape::new(1, 4);
        assert_eq!(shape.decode_edges(&[0xFF, 0x00, 0xFF, 0x07]).unwrap().len(), 2);
    }
}
