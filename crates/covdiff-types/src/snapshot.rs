use covdiff_bitmap::{BlockSet, EdgeSet};
use serde::{Deserialize, Serialize};

use crate::error::{IntegrityError, TypeError};
use crate::kind::CoverageKind;
use crate::mapping::LineSet;

/// Coverage observed during one completed fuzzing run.
///
/// ```text
/// ┌──────────────────────────────────────────────────────────────┐
/// │ CoverageSnapshot                                             │
/// │   total_lines    ← every line the binary can cover           │
/// │   covered_lines  ← ⊆ total_lines                             │
/// │   covered_blocks ← decoded from the block bitmap             │
/// │   covered_edges  ← decoded from the edge map, when recorded  │
/// └──────────────────────────────────────────────────────────────┘
/// ```
///
/// A snapshot is built once and never mutated. The constructor and the
/// deserializer both enforce `covered_lines ⊆ total_lines`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSnapshot")]
pub struct CoverageSnapshot {
    total_lines: LineSet,
    covered_lines: LineSet,
    covered_blocks: BlockSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    covered_edges: Option<EdgeSet>,
}

impl CoverageSnapshot {
    /// Assemble a snapshot from already-decoded sets.
    ///
    /// # Errors
    ///
    /// [`TypeError::LinesOutsideUniverse`] if a covered line is not part of
    /// `total_lines`.
    pub fn new(
        total_lines: LineSet,
        covered_lines: LineSet,
        covered_blocks: BlockSet,
        covered_edges: Option<EdgeSet>,
    ) -> Result<Self, TypeError> {
        let outside = covered_lines.difference(&total_lines).count();
        if outside > 0 {
            return Err(TypeError::LinesOutsideUniverse { count: outside });
        }
        Ok(Self {
            total_lines,
            covered_lines,
            covered_blocks,
            covered_edges,
        })
    }

    #[must_use]
    pub fn total_lines(&self) -> &LineSet {
        &self.total_lines
    }

    #[must_use]
    pub fn lines(&self) -> &LineSet {
        &self.covered_lines
    }

    #[must_use]
    pub fn blocks(&self) -> &BlockSet {
        &self.covered_blocks
    }

    /// `None` when the run was extracted without an edge map.
    #[must_use]
    pub fn edges(&self) -> Option<&EdgeSet> {
        self.covered_edges.as_ref()
    }

    #[must_use]
    pub fn has_kind(&self, kind: CoverageKind) -> bool {
        kind != CoverageKind::Edges || self.covered_edges.is_some()
    }

    /// Size of the covered set for `kind`, if the snapshot records it.
    #[must_use]
    pub fn covered_count(&self, kind: CoverageKind) -> Option<usize> {
        match kind {
            CoverageKind::Lines => Some(self.covered_lines.len()),
            CoverageKind::Blocks => Some(self.covered_blocks.len()),
            CoverageKind::Edges => self.covered_edges.as_ref().map(EdgeSet::len),
        }
    }

    /// Fraction of the line universe covered, `0.0` for an empty universe.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn line_ratio(&self) -> f64 {
        if self.total_lines.is_empty() {
            0.0
        } else {
            self.covered_lines.len() as f64 / self.total_lines.len() as f64
        }
    }

    /// Fingerprint of `total_lines`.
    #[must_use]
    pub fn universe_digest(&self) -> UniverseDigest {
        UniverseDigest::of(&self.total_lines)
    }
}

/// BLAKE3 hash over the sorted line universe.
///
/// Two snapshots come from the same binary exactly when their universes are
/// equal; the digest gives that universe a short printable name for
/// diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniverseDigest([u8; 32]);

impl UniverseDigest {
    #[must_use]
    pub fn of(lines: &LineSet) -> Self {
        let mut hasher = blake3::Hasher::new();
        for line in lines {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// First 8 bytes in hex, enough to tell universes apart in a log line.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

/// Check that every snapshot shares the universe of the first one.
///
/// Returns that shared universe, or `None` for an empty sequence.
///
/// # Errors
///
/// [`IntegrityError::UniverseMismatch`] naming the first snapshot whose
/// `total_lines` differs.
pub fn check_universe<'a, I>(snapshots: I) -> Result<Option<&'a LineSet>, IntegrityError>
where
    I: IntoIterator<Item = &'a CoverageSnapshot>,
{
    let mut iter = snapshots.into_iter();
    let Some(first) = iter.next() else {
        return Ok(None);
    };
    let expected = first.total_lines();

    for (offset, snapshot) in iter.enumerate() {
        let found = snapshot.total_lines();
        if found != expected {
            return Err(IntegrityError::UniverseMismatch {
                index: offset + 1,
                expected: UniverseDigest::of(expected).short(),
                expected_len: expected.len(),
                found: UniverseDigest::of(found).short(),
                found_len: found.len(),
            });
        }
    }
    Ok(Some(expected))
}

/// Unvalidated wire form of a snapshot.
#[derive(Deserialize)]
struct RawSnapshot {
    total_lines: LineSet,
    covered_lines: LineSet,
    covered_blocks: BlockSet,
    #[serde(default)]
    covered_edges: Option<EdgeSet>,
}

impl TryFrom<RawSnapshot> for CoverageSnapshot {
    type Error = TypeError;

    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        Self::new(
            raw.total_lines,
            raw.covered_lines,
            raw.covered_blocks,
            raw.covered_edges,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(labels: &[&str]) -> LineSet {
        labels.iter().map(|l| (*l).to_string()).collect()
    }

    fn snapshot(covered: &[&str], edges: Option<&[u32]>) -> CoverageSnapshot {
        CoverageSnapshot::new(
            lines(&["a:1", "a:2", "a:3", "a:4"]),
            lines(covered),
            [0, 1].into_iter().collect(),
            edges.map(|e| e.iter().copied().collect()),
        )
        .unwrap()
    }

    #[test]
    fn rejects_lines_outside_universe() {
        let err = CoverageSnapshot::new(
            lines(&["a:1"]),
            lines(&["a:1", "b:9", "c:3"]),
            BlockSet::new(),
            None,
        )
        .unwrap_err();
        assert_eq!(err, TypeError::LinesOutsideUniverse { count: 2 });
    }

    #[test]
    fn edges_are_optional() {
        let without = snapshot(&["a:1"], None);
        assert!(!without.has_kind(CoverageKind::Edges));
        assert!(without.has_kind(CoverageKind::Lines));
        assert_eq!(without.covered_count(CoverageKind::Edges), None);

        let with = snapshot(&["a:1"], Some(&[3, 9]));
        assert_eq!(with.covered_count(CoverageKind::Edges), Some(2));
    }

    #[test]
    fn line_ratio_uses_universe_as_denominator() {
        let snap = snapshot(&["a:1", "a:3"], None);
        assert!((snap.line_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn json_roundtrip_preserves_snapshot() {
        let snap = snapshot(&["a:2"], Some(&[1]));
        let json = serde_json::to_string(&snap).unwrap();
        let back: CoverageSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn deserialization_revalidates_subset_invariant() {
        let json = r#"{"total_lines":["a:1"],"covered_lines":["z:9"],"covered_blocks":[]}"#;
        let err = serde_json::from_str::<CoverageSnapshot>(json).unwrap_err();
        assert!(err.to_string().contains("outside the line universe"));
    }

    #[test]
    fn check_universe_accepts_matching_runs() {
        let runs = [snapshot(&["a:1"], None), snapshot(&["a:4"], None)];
        let universe = check_universe(&runs).unwrap().unwrap();
        assert_eq!(universe.len(), 4);
        assert_eq!(check_universe(std::iter::empty()).unwrap(), None);
    }

    #[test]
    fn check_universe_names_first_mismatch() {
        let stray = CoverageSnapshot::new(lines(&["a:1"]), LineSet::new(), BlockSet::new(), None)
            .unwrap();
        let runs = [snapshot(&[], None), snapshot(&[], None), stray];
        let err = check_universe(&runs).unwrap_err();
        assert_eq!(
            err,
            IntegrityError::UniverseMismatch {
                index: 2,
                expected: runs[0].universe_digest().short(),
                expected_len: 4,
                found: runs[2].universe_digest().short(),
                found_len: 1,
            }
        );
    }

    #[test]
    fn digest_tracks_universe_only() {
        let a = snapshot(&["a:1"], None);
        let b = snapshot(&["a:2", "a:3"], Some(&[7]));
        assert_eq!(a.universe_digest(), b.universe_digest());

        let other = CoverageSnapshot::new(lines(&["x:1"]), LineSet::new(), BlockSet::new(), None)
            .unwrap();
        assert_ne!(a.universe_digest(), other.universe_digest());
        assert_eq!(a.universe_digest().short().len(), 16);
    }
}
