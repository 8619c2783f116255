use covdiff_bitmap::BitmapShape;
use covdiff_types::{CoverageSnapshot, LineSet, SourceMapping};
use log::{debug, info};

use crate::error::ExtractError;

/// Builds one [`CoverageSnapshot`] per run from the raw bitmaps a run
/// leaves behind.
///
/// The extractor borrows the binary's [`SourceMapping`] and computes the
/// line universe once up front, so extracting hundreds of runs of the same
/// binary costs one decode and one table lookup pass per run.
///
/// Extraction proceeds in three steps:
///
///   1. **Blocks**: decode the bit-packed block bitmap.
///   2. **Lines**: map every covered block through the table. A block the
///      table does not know aborts the run.
///   3. **Edges**: decode the byte-per-edge map, when one was recorded.
///
/// # Example
///
/// ```rust
/// use covdiff_extract::SnapshotExtractor;
/// use covdiff_types::SourceMapping;
///
/// let mapping = SourceMapping::parse("0=f.c:10\n1=\n2=f.c:12\n").unwrap();
/// let snapshot = SnapshotExtractor::new(&mapping)
///     .extract(&[0b0000_0101], None)
///     .unwrap();
///
/// assert_eq!(snapshot.blocks().len(), 2);
/// assert!(snapshot.lines().contains("f.c:12"));
/// ```
#[derive(Debug)]
pub struct SnapshotExtractor<'m> {
    mapping: &'m SourceMapping,
    total_lines: LineSet,
    shape: BitmapShape,
}

impl<'m> SnapshotExtractor<'m> {
    #[must_use]
    pub fn new(mapping: &'m SourceMapping) -> Self {
        Self {
            mapping,
            total_lines: mapping.total_lines(),
            shape: BitmapShape::default(),
        }
    }

    /// Pin the expected bitmap lengths for every run.
    #[must_use]
    pub fn with_shape(mut self, shape: BitmapShape) -> Self {
        self.shape = shape;
        self
    }

    /// The line universe shared by every snapshot this extractor produces.
    #[must_use]
    pub fn total_lines(&self) -> &LineSet {
        &self.total_lines
    }

    /// Extract the snapshot of one run.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::Bitmap`] if a buffer does not match the pinned
    ///   shape or overflows the location space.
    /// - [`ExtractError::Type`] if a covered block is missing from the
    ///   mapping table.
    pub fn extract(
        &self,
        block_bitmap: &[u8],
        edge_map: Option<&[u8]>,
    ) -> Result<CoverageSnapshot, ExtractError> {
        let blocks = self.shape.decode_blocks(block_bitmap)?;
        let lines = self.mapping.covered_lines(&blocks)?;
        let edges = edge_map
            .map(|map| self.shape.decode_edges(map))
            .transpose()?;

        debug!(
            "decoded {} block bytes, {} edge bytes",
            block_bitmap.len(),
            edge_map.map_or(0, <[u8]>::len)
        );

        let snapshot = CoverageSnapshot::new(self.total_lines.clone(), lines, blocks, edges)?;

        info!("Unique lines in project: {}", snapshot.total_lines().len());
        info!(
            "Lines visited: {}, {:.6}",
            snapshot.lines().len(),
            snapshot.line_ratio()
        );
        info!("BB visited: {}", snapshot.blocks().len());
        match snapshot.edges() {
            Some(edges) => info!("Edges visited: {}", edges.len()),
            None => info!("Edges visited: n/a (no edge map)"),
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use covdiff_bitmap::{BitmapError, NEVER_EXECUTED};
    use covdiff_types::TypeError;

    use super::*;

    fn mapping() -> SourceMapping {
        SourceMapping::parse("0=f.c:10\n1=\n2=f.c:12\n3=f.c:12,f.c:13\n8=g.c:1\n").unwrap()
    }

    #[test]
    fn extracts_blocks_lines_and_edges() {
        let mapping = mapping();
        let mut edges = [NEVER_EXECUTED; 4];
        edges[2] = 0x01;

        let snap = SnapshotExtractor::new(&mapping)
            .extract(&[0b0000_0101, 0x00], Some(&edges))
            .unwrap();

        assert_eq!(snap.blocks().iter().copied().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(
            snap.lines().iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["f.c:10", "f.c:12"]
        );
        assert_eq!(snap.edges().unwrap().iter().copied().collect::<Vec<_>>(), vec![2]);
        assert_eq!(snap.total_lines().len(), 4);
    }

    #[test]
    fn block_without_line_info_contributes_no_line() {
        let mapping = mapping();
        let snap = SnapshotExtractor::new(&mapping).extract(&[0b0000_0010], None).unwrap();
        assert_eq!(snap.blocks().len(), 1);
        assert!(snap.lines().is_empty());
    }

    #[test]
    fn unknown_block_aborts_the_run() {
        let mapping = mapping();
        let err = SnapshotExtractor::new(&mapping)
            .extract(&[0x00, 0b0000_0010], None)
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Type(TypeError::UnknownBlock { id: 9 })
        ));
    }

    #[test]
    fn edge_map_of_any_length_decodes() {
        let mapping = mapping();
        let snap = SnapshotExtractor::new(&mapping)
            .extract(&[0x01], Some(&[NEVER_EXECUTED, 0x02, NEVER_EXECUTED]))
            .unwrap();
        assert_eq!(snap.edges().unwrap().iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn pinned_edge_length_aborts_the_run() {
        let mapping = mapping();
        let err = SnapshotExtractor::new(&mapping)
            .with_shape(BitmapShape {
                block_bytes: None,
                edge_bytes: Some(4),
            })
            .extract(&[0x01], Some(&[NEVER_EXECUTED; 3]))
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Bitmap(BitmapError::LengthMismatch {
                map: "edge",
                expected: 4,
                found: 3
            })
        ));
    }

    #[test]
    fn shape_is_enforced_on_every_run() {
        let mapping = mapping();
        let extractor = SnapshotExtractor::new(&mapping).with_shape(BitmapShape::new(2, 4));
        assert!(extractor.extract(&[0x01, 0x00], None).is_ok());
        assert!(matches!(
            extractor.extract(&[0x01], None),
            Err(ExtractError::Bitmap(BitmapError::LengthMismatch { .. }))
        ));
    }

    #[test]
    fn universe_is_identical_across_runs() {
        let mapping = mapping();
        let extractor = SnapshotExtractor::new(&mapping);
        let a = extractor.extract(&[0x01], None).unwrap();
        let b = extractor.extract(&[0x0C, 0x01], None).unwrap();
        assert_eq!(a.total_lines(), b.total_lines());
        assert_eq!(a.universe_digest(), b.universe_digest());
    }
}
