use covdiff_types::{BlockSet, CoverageKind, CoverageSnapshot, EdgeSet, LineSet};

use crate::error::AnalysisError;

pub(crate) fn line_sets(runs: &[CoverageSnapshot]) -> Vec<&LineSet> {
    runs.iter().map(CoverageSnapshot::lines).collect()
}

pub(crate) fn block_sets(runs: &[CoverageSnapshot]) -> Vec<&BlockSet> {
    runs.iter().map(CoverageSnapshot::blocks).collect()
}

/// Edge sets of every run, or `MissingKind` naming the first run without.
pub(crate) fn edge_sets<'a>(
    runs: &'a [CoverageSnapshot],
    who: &str,
) -> Result<Vec<&'a EdgeSet>, AnalysisError> {
    runs.iter()
        .enumerate()
        .map(|(run, snapshot)| {
            snapshot.edges().ok_or_else(|| AnalysisError::MissingKind {
                kind: CoverageKind::Edges,
                who: who.to_string(),
                run,
            })
        })
        .collect()
}
