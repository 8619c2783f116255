use std::collections::{BTreeMap, BTreeSet};

use covdiff_types::{BlockId, CoverageKind, CoverageSnapshot, EdgeId, Label};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::select;

/// Direction the next non-integral score will be rounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundDirection {
    Up,
    Down,
}

/// Alternating rounding state for stability scores.
///
/// A location seen in `h` of `N` runs scores `10·h/N`. When that is not an
/// integer the score is rounded up and down alternately, so that across
/// many locations the rounding errors cancel out instead of piling up in
/// one direction. The state starts at [`RoundDirection::Up`].
///
/// A round-down never goes below 1, because a location that was observed
/// at least once must keep a non-zero score. A clamped round-down still
/// counts as a round-down and flips the state back to up.
///
/// ```text
///   state │ exact? │ result         │ next state
///   ──────┼────────┼────────────────┼───────────
///   any   │ yes    │ exact          │ unchanged
///   Up    │ no     │ floor + 1      │ Down
///   Down  │ no     │ max(floor, 1)  │ Up
/// ```
///
/// The state is an explicit value passed through aggregation rather than
/// hidden in a global, so two aggregations never influence each other.
#[derive(Clone, Debug)]
pub struct RoundingBias {
    next: RoundDirection,
    raised: usize,
    lowered: usize,
}

impl Default for RoundingBias {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundingBias {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: RoundDirection::Up,
            raised: 0,
            lowered: 0,
        }
    }

    /// Direction the next non-integral score will take.
    #[must_use]
    pub fn next(&self) -> RoundDirection {
        self.next
    }

    /// Non-integral scores rounded up so far.
    #[must_use]
    pub fn raised(&self) -> usize {
        self.raised
    }

    /// Non-integral scores rounded down so far, clamped ones included.
    #[must_use]
    pub fn lowered(&self) -> usize {
        self.lowered
    }

    /// Score a location observed in `hits` of `runs` runs.
    ///
    /// Callers guarantee `0 < hits <= runs`.
    pub fn score(&mut self, hits: usize, runs: usize) -> u8 {
        debug_assert!(hits > 0 && hits <= runs);
        let scaled = hits * 10;
        // floor ≤ 10 because hits ≤ runs
        let floor = u8::try_from(scaled / runs).unwrap_or(10);

        if scaled % runs == 0 {
            return floor;
        }
        match self.next {
            RoundDirection::Up => {
                self.next = RoundDirection::Down;
                self.raised += 1;
                floor + 1
            }
            RoundDirection::Down => {
                self.next = RoundDirection::Up;
                self.lowered += 1;
                floor.max(1)
            }
        }
    }
}

/// Per-location stability of one coverage kind across N runs.
///
/// Scores are in `1..=10`: the fraction of runs that reached the location,
/// scaled by ten and rounded with a [`RoundingBias`]. Locations never
/// observed are absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "L: Serialize",
    deserialize = "L: Ord + Deserialize<'de>"
))]
pub struct Stability<L> {
    runs: usize,
    scores: BTreeMap<L, u8>,
    raised: usize,
    lowered: usize,
}

impl<L: Ord> Stability<L> {
    /// Number of runs aggregated.
    #[must_use]
    pub fn runs(&self) -> usize {
        self.runs
    }

    /// Location → score, in location order.
    #[must_use]
    pub fn scores(&self) -> &BTreeMap<L, u8> {
        &self.scores
    }

    #[must_use]
    pub fn score(&self, location: &L) -> Option<u8> {
        self.scores.get(location).copied()
    }

    /// Locations seen in at least one run.
    #[must_use]
    pub fn observed(&self) -> usize {
        self.scores.len()
    }

    /// Non-integral scores rounded up.
    #[must_use]
    pub fn raised(&self) -> usize {
        self.raised
    }

    /// Non-integral scores rounded down, clamped ones included.
    #[must_use]
    pub fn lowered(&self) -> usize {
        self.lowered
    }

    #[must_use]
    pub fn histogram(&self) -> Histogram {
        let mut histogram = Histogram::default();
        for &score in self.scores.values() {
            histogram.add(score);
        }
        histogram
    }

    pub fn iter(&self) -> impl Iterator<Item = (&L, u8)> {
        self.scores.iter().map(|(l, s)| (l, *s))
    }
}

/// Aggregate per-run location sets into a [`Stability`] map with a fresh
/// [`RoundingBias`].
///
/// # Errors
///
/// [`AnalysisError::NoRuns`] if `runs` yields no sets.
pub fn aggregate<'a, L, I>(runs: I) -> Result<Stability<L>, AnalysisError>
where
    L: Ord + Clone + 'a,
    I: IntoIterator<Item = &'a BTreeSet<L>>,
{
    aggregate_with(runs, &mut RoundingBias::new())
}

/// Like [`aggregate`], threading the caller's rounding state. Locations
/// are scored in ascending order.
///
/// # Errors
///
/// [`AnalysisError::NoRuns`] if `runs` yields no sets.
pub fn aggregate_with<'a, L, I>(
    runs: I,
    bias: &mut RoundingBias,
) -> Result<Stability<L>, AnalysisError>
where
    L: Ord + Clone + 'a,
    I: IntoIterator<Item = &'a BTreeSet<L>>,
{
    let mut hits: BTreeMap<&L, usize> = BTreeMap::new();
    let mut runs_seen = 0;
    for set in runs {
        runs_seen += 1;
        for location in set {
            *hits.entry(location).or_insert(0) += 1;
        }
    }
    if runs_seen == 0 {
        return Err(AnalysisError::NoRuns);
    }

    let (raised_before, lowered_before) = (bias.raised(), bias.lowered());
    let scores = hits
        .into_iter()
        .map(|(location, h)| (location.clone(), bias.score(h, runs_seen)))
        .collect();

    Ok(Stability {
        runs: runs_seen,
        scores,
        raised: bias.raised() - raised_before,
        lowered: bias.lowered() - lowered_before,
    })
}

/// Count of locations per stability score.
///
/// Index `i` holds the number of locations with score `i + 1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram([usize; 10]);

impl Histogram {
    fn add(&mut self, score: u8) {
        if let Some(slot) = usize::from(score)
            .checked_sub(1)
            .and_then(|i| self.0.get_mut(i))
        {
            *slot += 1;
        }
    }

    /// Locations with exactly `score` (1..=10).
    #[must_use]
    pub fn count(&self, score: u8) -> usize {
        usize::from(score)
            .checked_sub(1)
            .and_then(|i| self.0.get(i))
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// `(score, count)` pairs for scores 1 through 10.
    pub fn iter(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        (1u8..=10).zip(self.0.iter().copied())
    }
}

/// Stability of one fuzzer at every granularity.
///
/// Edge stability is present only when every run recorded edges.
/// Histograms are stored next to the exact maps so a persisted record is
/// readable without recomputation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzerStability {
    pub runs: usize,
    pub lines: Stability<Label>,
    pub blocks: Stability<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<Stability<EdgeId>>,
    pub histograms: BTreeMap<CoverageKind, Histogram>,
}

impl FuzzerStability {
    /// Aggregate every kind over `runs`. Each kind gets its own rounding
    /// state.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::NoRuns`] for an empty slice.
    pub fn from_runs(runs: &[CoverageSnapshot]) -> Result<Self, AnalysisError> {
        let lines = aggregate(runs.iter().map(CoverageSnapshot::lines))?;
        let blocks = aggregate(runs.iter().map(CoverageSnapshot::blocks))?;
        let edges = match select::edge_sets(runs, "fuzzer") {
            Ok(sets) => Some(aggregate(sets)?),
            Err(_) => {
                info!("Not every run recorded edges, skipping edge stability");
                None
            }
        };

        let mut histograms = BTreeMap::new();
        histograms.insert(CoverageKind::Lines, lines.histogram());
        histograms.insert(CoverageKind::Blocks, blocks.histogram());
        if let Some(edges) = &edges {
            histograms.insert(CoverageKind::Edges, edges.histogram());
        }
        debug!(
            "aggregated {} runs: {} lines, {} blocks observed",
            runs.len(),
            lines.observed(),
            blocks.observed()
        );

        Ok(Self {
            runs: runs.len(),
            lines,
            blocks,
            edges,
            histograms,
        })
    }

    #[must_use]
    pub fn histogram(&self, kind: CoverageKind) -> Option<&Histogram> {
        self.histograms.get(&kind)
    }

    /// Number of observed locations of `kind`.
    #[must_use]
    pub fn observed(&self, kind: CoverageKind) -> Option<usize> {
        match kind {
            CoverageKind::Lines => Some(self.lines.observed()),
            CoverageKind::Blocks => Some(self.blocks.observed()),
            CoverageKind::Edges => self.edges.as_ref().map(Stability::observed),
        }
    }

    /// Scores of `kind` as `f64`, for summary statistics.
    #[must_use]
    pub fn score_values(&self, kind: CoverageKind) -> Option<Vec<f64>> {
        fn values<L: Ord>(s: &Stability<L>) -> Vec<f64> {
            s.scores().values().map(|&v| f64::from(v)).collect()
        }
        match kind {
            CoverageKind::Lines => Some(values(&self.lines)),
            CoverageKind::Blocks => Some(values(&self.blocks)),
            CoverageKind::Edges => self.edges.as_ref().map(values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs_from_hits(hits: &[(u32, usize)], n: usize) -> Vec<BTreeSet<u32>> {
        (0..n)
            .map(|run| {
                hits.iter()
                    .filter(|(_, h)| run < *h)
                    .map(|(id, _)| *id)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn integral_scores_are_exact() {
        // A in 3 of 10 runs, B in all 10.
        let runs = runs_from_hits(&[(1, 3), (2, 10)], 10);
        let s = aggregate(&runs).unwrap();
        assert_eq!(s.score(&1), Some(3));
        assert_eq!(s.score(&2), Some(10));
        assert_eq!(s.raised() + s.lowered(), 0);
    }

    #[test]
    fn single_hit_in_three_runs_is_never_zero() {
        let runs = runs_from_hits(&[(7, 1)], 3);
        let s = aggregate(&runs).unwrap();
        let score = s.score(&7).unwrap();
        assert!(score == 3 || score == 4);
        // Fresh state rounds the first non-integral score up.
        assert_eq!(score, 4);
    }

    #[test]
    fn rounding_alternates_in_location_order() {
        // 10/3 = 3.33 for every location.
        let runs = runs_from_hits(&[(1, 1), (2, 1), (3, 1), (4, 1)], 3);
        let s = aggregate(&runs).unwrap();
        let scores: Vec<u8> = s.scores().values().copied().collect();
        assert_eq!(scores, vec![4, 3, 4, 3]);
        assert_eq!(s.raised(), 2);
        assert_eq!(s.lowered(), 2);
    }

    #[test]
    fn clamped_round_down_flips_back_to_up() {
        let mut bias = RoundingBias::new();
        // 10/11 → up to 1
        assert_eq!(bias.score(1, 11), 1);
        assert_eq!(bias.next(), RoundDirection::Down);
        // 10/11 → floor 0, clamped to 1, flips back
        assert_eq!(bias.score(1, 11), 1);
        assert_eq!(bias.next(), RoundDirection::Up);
        // 50/11 → floor 4, rounded up
        assert_eq!(bias.score(5, 11), 5);
        assert_eq!(bias.next(), RoundDirection::Down);
        assert_eq!((bias.raised(), bias.lowered()), (2, 1));
    }

    #[test]
    fn integral_scores_leave_state_untouched() {
        let mut bias = RoundingBias::new();
        assert_eq!(bias.score(5, 10), 5);
        assert_eq!(bias.next(), RoundDirection::Up);
    }

    #[test]
    fn bias_stays_balanced() {
        let hits: Vec<(u32, usize)> = (0..200).map(|i| (i, (i as usize % 6) + 1)).collect();
        let runs = runs_from_hits(&hits, 7);
        let s = aggregate(&runs).unwrap();
        let diff = s.raised().abs_diff(s.lowered());
        assert!(diff <= 1, "raised {} lowered {}", s.raised(), s.lowered());
    }

    #[test]
    fn bias_stays_balanced_when_floor_is_zero() {
        // Every location in 1 of 11 runs: 0.91 each.
        let hits: Vec<(u32, usize)> = (0..5).map(|i| (i, 1)).collect();
        let s = aggregate(&runs_from_hits(&hits, 11)).unwrap();
        assert!(s.iter().all(|(_, v)| v == 1));
        assert_eq!((s.raised(), s.lowered()), (3, 2));

        // Mixed counts over 23 runs, some below a tenth.
        let hits: Vec<(u32, usize)> = (0..300).map(|i| (i, (i as usize % 22) + 1)).collect();
        let s = aggregate(&runs_from_hits(&hits, 23)).unwrap();
        let diff = s.raised().abs_diff(s.lowered());
        assert!(diff <= 1, "raised {} lowered {}", s.raised(), s.lowered());
    }

    #[test]
    fn observed_never_shrinks_with_more_runs() {
        let hits: Vec<(u32, usize)> = (0..40).map(|i| (i, (i as usize % 9) + 1)).collect();
        let runs = runs_from_hits(&hits, 9);
        let mut previous = 0;
        for k in 1..=runs.len() {
            let observed = aggregate(&runs[..k]).unwrap().observed();
            assert!(observed >= previous, "{k} runs: {observed} < {previous}");
            previous = observed;
        }
        assert_eq!(previous, 40);
    }

    #[test]
    fn scores_stay_in_range() {
        let hits: Vec<(u32, usize)> = (0..50).map(|i| (i, (i as usize % 13) + 1)).collect();
        let runs = runs_from_hits(&hits, 13);
        let s = aggregate(&runs).unwrap();
        assert!(s.iter().all(|(_, v)| (1..=10).contains(&v)));
    }

    #[test]
    fn histogram_sums_to_observed() {
        let runs = runs_from_hits(&[(1, 1), (2, 2), (3, 3), (9, 3)], 3);
        let s = aggregate(&runs).unwrap();
        let h = s.histogram();
        assert_eq!(h.total(), s.observed());
        assert_eq!(h.count(10), 2);
        assert_eq!(h.count(0), 0);
        assert_eq!(h.iter().count(), 10);
    }

    #[test]
    fn zero_runs_is_an_error() {
        let runs: Vec<BTreeSet<u32>> = Vec::new();
        assert_eq!(aggregate(&runs).unwrap_err(), AnalysisError::NoRuns);
    }

    #[test]
    fn threaded_bias_continues_across_calls() {
        let mut bias = RoundingBias::new();
        let runs = runs_from_hits(&[(1, 1)], 3);
        let first = aggregate_with(&runs, &mut bias).unwrap();
        let second = aggregate_with(&runs, &mut bias).unwrap();
        assert_eq!(first.score(&1), Some(4));
        assert_eq!(second.score(&1), Some(3));
        assert_eq!((second.raised(), second.lowered()), (0, 1));
    }

    #[test]
    fn stability_serializes_with_integer_keys() {
        let runs = runs_from_hits(&[(3, 1), (8, 2)], 2);
        let s = aggregate(&runs).unwrap();
        let json = serde_json::to_string(&s).unwrap();
        let back: Stability<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
