use std::collections::BTreeSet;

use crate::error::BitmapError;

/// Identifier of an instrumented edge: its byte offset in the edge map.
pub type EdgeId = u32;

/// Set of covered edges, in ascending id order.
pub type EdgeSet = BTreeSet<EdgeId>;

/// Byte value of an edge slot that was never hit.
///
/// The fuzzer keeps a "virgin" map initialised to all ones and clears bits
/// as hit-count buckets are observed, so any slot that still reads `0xFF`
/// was never executed.
pub const NEVER_EXECUTED: u8 = 0xFF;

/// Decode a byte-per-edge map into the set of covered edge ids.
///
/// Byte `i` describes edge `i`; every value other than [`NEVER_EXECUTED`]
/// marks the edge as covered. Any length is accepted, including zero.
///
/// # Errors
///
/// [`BitmapError::TooLarge`] if an offset would not fit in a `u32`.
pub fn decode_edges(buf: &[u8]) -> Result<EdgeSet, BitmapError> {
    check_edge_len(buf)?;
    #[allow(clippy::cast_possible_truncation)]
    let set = buf
        .iter()
        .enumerate()
        .filter(|(_, byte)| **byte != NEVER_EXECUTED)
        .map(|(index, _)| index as EdgeId)
        .collect();
    Ok(set)
}

/// Number of covered edges in a map, without building the set.
///
/// # Errors
///
/// Same as [`decode_edges`].
pub fn count_edges(buf: &[u8]) -> Result<usize, BitmapError> {
    check_edge_len(buf)?;
    Ok(buf.iter().filter(|b| **b != NEVER_EXECUTED).count())
}

fn check_edge_len(buf: &[u8]) -> Result<(), BitmapError> {
    if EdgeId::try_from(buf.len().saturating_sub(1)).is_err() {
        return Err(BitmapError::TooLarge {
            map: "edge",
            len: buf.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_map_has_no_edges() {
        assert!(decode_edges(&[NEVER_EXECUTED; 1024]).unwrap().is_empty());
    }

    #[test]
    fn any_non_sentinel_value_is_covered() {
        let mut map = [NEVER_EXECUTED; 8];
        map[1] = 0x00;
        map[4] = 0x7F;
        map[7] = 0xFE;
        let set = decode_edges(&map).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 4, 7]);
    }

    #[test]
    fn count_matches_decoded_len() {
        let mut map = [NEVER_EXECUTED; 16];
        map[0] = 1;
        map[15] = 2;
        assert_eq!(count_edges(&map).unwrap(), 2);
        assert_eq!(decode_edges(&map).unwrap().len(), 2);
    }

    #[test]
    fn length_need_not_be_power_of_two() {
        let mut map = [NEVER_EXECUTED; 12];
        map[10] = 3;
        let set = decode_edges(&map).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![10]);
        assert_eq!(count_edges(&map).unwrap(), 1);
    }

    #[test]
    fn single_slot_map_is_valid() {
        assert_eq!(decode_edges(&[0x01]).unwrap().len(), 1);
    }

    #[test]
    fn empty_map_is_empty_set() {
        assert!(decode_edges(&[]).unwrap().is_empty());
        assert_eq!(count_edges(&[]).unwrap(), 0);
    }
}
