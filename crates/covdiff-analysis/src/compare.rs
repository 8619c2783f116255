use std::collections::BTreeSet;

use covdiff_types::{CoverageKind, CoverageSnapshot, check_universe};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::{CompareConfig, CompareMode, TruncationPolicy};
use crate::error::AnalysisError;
use crate::select;
use crate::stats::{self, ConfidenceInterval, Distribution, MannWhitney};

/// Spread attached to a reported value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Spread {
    /// Per-run sample: population std and, for two or more runs, a
    /// confidence interval of the mean.
    Distribution {
        std: f64,
        interval: Option<ConfidenceInterval>,
    },
    /// Cumulative counts are single numbers.
    NotApplicable,
}

/// A reported quantity with its spread.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub value: f64,
    pub spread: Spread,
}

impl Measure {
    fn count(n: usize) -> Self {
        Self {
            value: n as f64,
            spread: Spread::NotApplicable,
        }
    }

    fn from_distribution(d: &Distribution) -> Self {
        Self {
            value: d.mean,
            spread: Spread::Distribution {
                std: d.std,
                interval: d.interval,
            },
        }
    }

    /// Multiply the value and its spread by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        let spread = match self.spread {
            Spread::Distribution { std, interval } => Spread::Distribution {
                std: std * factor,
                interval: interval.map(|ci| ConfidenceInterval {
                    low: ci.low * factor,
                    high: ci.high * factor,
                }),
            },
            Spread::NotApplicable => Spread::NotApplicable,
        };
        Self {
            value: self.value * factor,
            spread,
        }
    }

    #[must_use]
    pub fn std(&self) -> Option<f64> {
        match self.spread {
            Spread::Distribution { std, .. } => Some(std),
            Spread::NotApplicable => None,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Option<ConfidenceInterval> {
        match self.spread {
            Spread::Distribution { interval, .. } => interval,
            Spread::NotApplicable => None,
        }
    }
}

/// How a candidate fuzzer's coverage differs from a baseline's, for one
/// coverage kind.
///
/// "New" counts locations the candidate reached and the baseline did not;
/// "missed" the reverse. Percentages are relative to `baseline_size`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionalComparison {
    pub kind: CoverageKind,
    pub mode: CompareMode,
    /// Runs used per side after truncation.
    pub runs: usize,
    /// Mean per-run size (per-run mode) or union size (cumulative mode).
    pub baseline_size: f64,
    pub candidate_size: f64,
    pub new: Measure,
    pub missed: Measure,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_percent: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missed_percent: Option<Measure>,
    /// Mann–Whitney U of per-run missed against per-run new counts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub significance: Option<MannWhitney>,
}

/// Locations reached by only one side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetDiff<L> {
    /// In the candidate, not in the baseline.
    pub new: BTreeSet<L>,
    /// In the baseline, not in the candidate.
    pub missed: BTreeSet<L>,
}

#[must_use]
pub fn diff_sets<L: Ord + Clone>(baseline: &BTreeSet<L>, candidate: &BTreeSet<L>) -> SetDiff<L> {
    SetDiff {
        new: candidate.difference(baseline).cloned().collect(),
        missed: baseline.difference(candidate).cloned().collect(),
    }
}

/// Set overlap of two single runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlap {
    pub kind: CoverageKind,
    pub left: usize,
    pub right: usize,
    pub union: usize,
    pub intersection: usize,
    pub left_only: usize,
    pub right_only: usize,
}

/// Compare two snapshots of the same binary at one granularity.
///
/// # Errors
///
/// - [`AnalysisError::Integrity`] if the snapshots have different universes.
/// - [`AnalysisError::MissingKind`] if `kind` is edges and either snapshot
///   lacks them.
pub fn overlap(
    left: &CoverageSnapshot,
    right: &CoverageSnapshot,
    kind: CoverageKind,
) -> Result<Overlap, AnalysisError> {
    check_universe([left, right])?;

    fn count<L: Ord>(kind: CoverageKind, a: &BTreeSet<L>, b: &BTreeSet<L>) -> Overlap {
        let intersection = a.intersection(b).count();
        Overlap {
            kind,
            left: a.len(),
            right: b.len(),
            union: a.len() + b.len() - intersection,
            intersection,
            left_only: a.len() - intersection,
            right_only: b.len() - intersection,
        }
    }

    Ok(match kind {
        CoverageKind::Lines => count(kind, left.lines(), right.lines()),
        CoverageKind::Blocks => count(kind, left.blocks(), right.blocks()),
        CoverageKind::Edges => {
            let missing = |who: &str| AnalysisError::MissingKind {
                kind,
                who: who.to_string(),
                run: 0,
            };
            let l = left.edges().ok_or_else(|| missing("left"))?;
            let r = right.edges().ok_or_else(|| missing("right"))?;
            count(kind, l, r)
        }
    })
}

/// Compares the runs of a candidate fuzzer against a baseline fuzzer.
///
/// ```text
///   baseline runs ─┐
///                  ├─► min-runs check ─► universe check ─► truncate to min(N)
///   candidate runs ┘                                              │
///                                                                 ▼
///                          per-run stats / cumulative ◄── kind select
/// ```
///
/// # Example
///
/// ```rust
/// use covdiff_analysis::{CompareConfig, CompareMode, DifferentialComparator};
/// use covdiff_types::{CoverageKind, CoverageSnapshot, LineSet};
///
/// let run = |blocks: &[u32]| {
///     CoverageSnapshot::new(LineSet::new(), LineSet::new(), blocks.iter().copied().collect(), None)
///         .unwrap()
/// };
/// let baseline = [run(&[1, 2]), run(&[2, 3])];
/// let candidate = [run(&[2, 4]), run(&[3])];
///
/// let config = CompareConfig { mode: CompareMode::Cumulative, ..CompareConfig::default() };
/// let result = DifferentialComparator::new(config)
///     .compare(&baseline, &candidate, CoverageKind::Blocks)
///     .unwrap();
///
/// assert_eq!(result.new.value, 1.0);
/// assert_eq!(result.missed.value, 1.0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct DifferentialComparator {
    config: CompareConfig,
}

impl DifferentialComparator {
    #[must_use]
    pub fn new(config: CompareConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Compare `candidate` against `baseline` at granularity `kind`.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::InvalidConfidence`] for a confidence outside (0, 1).
    /// - [`AnalysisError::NotEnoughRuns`] if a side has fewer than
    ///   `min_runs` (and at least one) runs.
    /// - [`AnalysisError::Integrity`] if any two runs disagree on the line
    ///   universe.
    /// - [`AnalysisError::MissingKind`] if `kind` is edges and a compared
    ///   run lacks them. Runs removed by truncation are not inspected.
    /// - [`AnalysisError::RunCountMismatch`] under the strict truncation
    ///   policy.
    pub fn compare(
        &self,
        baseline: &[CoverageSnapshot],
        candidate: &[CoverageSnapshot],
        kind: CoverageKind,
    ) -> Result<FunctionalComparison, AnalysisError> {
        let confidence = self.config.confidence;
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(AnalysisError::InvalidConfidence { value: confidence });
        }
        let required = self.config.min_runs.max(1);
        for (who, runs) in [("baseline", baseline), ("candidate", candidate)] {
            if runs.len() < required {
                return Err(AnalysisError::NotEnoughRuns {
                    who: who.to_string(),
                    found: runs.len(),
                    required,
                });
            }
        }
        check_universe(baseline.iter().chain(candidate))?;

        // Truncate first so runs that are dropped anyway are never inspected.
        let n = self.paired_runs(baseline.len(), candidate.len())?;
        let (baseline, candidate) = (&baseline[..n], &candidate[..n]);

        match kind {
            CoverageKind::Lines => self.compare_sets(
                kind,
                &select::line_sets(baseline),
                &select::line_sets(candidate),
            ),
            CoverageKind::Blocks => self.compare_sets(
                kind,
                &select::block_sets(baseline),
                &select::block_sets(candidate),
            ),
            CoverageKind::Edges => self.compare_sets(
                kind,
                &select::edge_sets(baseline, "baseline")?,
                &select::edge_sets(candidate, "candidate")?,
            ),
        }
    }

    /// Compare already-selected location sets, one per run.
    ///
    /// Applies the truncation policy and the configured mode; universe and
    /// run-count checks are the caller's job.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::NoRuns`] if either side is empty,
    /// [`AnalysisError::RunCountMismatch`] under the strict policy.
    pub fn compare_sets<L: Ord>(
        &self,
        kind: CoverageKind,
        baseline: &[&BTreeSet<L>],
        candidate: &[&BTreeSet<L>],
    ) -> Result<FunctionalComparison, AnalysisError> {
        let n = self.paired_runs(baseline.len(), candidate.len())?;
        let (baseline, candidate) = (&baseline[..n], &candidate[..n]);

        match self.config.mode {
            CompareMode::PerRun => self.per_run(kind, baseline, candidate),
            CompareMode::Cumulative => Ok(self.cumulative(kind, baseline, candidate)),
        }
    }

    /// Number of runs to compare per side under the truncation policy.
    fn paired_runs(&self, baseline: usize, candidate: usize) -> Result<usize, AnalysisError> {
        let n = baseline.min(candidate);
        if n == 0 {
            return Err(AnalysisError::NoRuns);
        }
        if baseline != candidate {
            match self.config.truncation {
                TruncationPolicy::Strict => {
                    return Err(AnalysisError::RunCountMismatch {
                        baseline,
                        candidate,
                    });
                }
                TruncationPolicy::Truncate => {
                    warn!("Not all fuzzers have same number of runs, using only {n} runs");
                }
            }
        }
        Ok(n)
    }

    fn per_run<L: Ord>(
        &self,
        kind: CoverageKind,
        baseline: &[&BTreeSet<L>],
        candidate: &[&BTreeSet<L>],
    ) -> Result<FunctionalComparison, AnalysisError> {
        let n = baseline.len();
        let mut new = Vec::with_capacity(n);
        let mut missed = Vec::with_capacity(n);
        let mut baseline_sizes = Vec::with_capacity(n);
        let mut candidate_sizes = Vec::with_capacity(n);

        for (run, (b, c)) in baseline.iter().zip(candidate).enumerate() {
            let new_i = c.difference(b).count();
            let missed_i = b.difference(c).count();
            debug!("{kind} run {run}: new {new_i}, missed {missed_i}");
            new.push(new_i as f64);
            missed.push(missed_i as f64);
            baseline_sizes.push(b.len() as f64);
            candidate_sizes.push(c.len() as f64);
        }

        let confidence = self.config.confidence;
        let describe = |values: &[f64]| {
            stats::describe(values, confidence).ok_or(AnalysisError::NoRuns)
        };
        let new_dist = describe(&new)?;
        let missed_dist = describe(&missed)?;
        let baseline_size = describe(&baseline_sizes)?.mean;
        let candidate_size = describe(&candidate_sizes)?.mean;

        info!(
            "{kind}: new {:.2} (std {:.2}), missed {:.2} (std {:.2}) over {n} runs",
            new_dist.mean, new_dist.std, missed_dist.mean, missed_dist.std
        );

        Ok(self.finish(
            kind,
            n,
            baseline_size,
            candidate_size,
            Measure::from_distribution(&new_dist),
            Measure::from_distribution(&missed_dist),
            stats::mann_whitney_u(&missed, &new),
        ))
    }

    fn cumulative<L: Ord>(
        &self,
        kind: CoverageKind,
        baseline: &[&BTreeSet<L>],
        candidate: &[&BTreeSet<L>],
    ) -> FunctionalComparison {
        let baseline_union: BTreeSet<&L> = baseline.iter().flat_map(|s| s.iter()).collect();
        let candidate_union: BTreeSet<&L> = candidate.iter().flat_map(|s| s.iter()).collect();
        let new = candidate_union.difference(&baseline_union).count();
        let missed = baseline_union.difference(&candidate_union).count();

        info!(
            "{kind}: baseline {}, candidate {}, new {new}, missed {missed}",
            baseline_union.len(),
            candidate_union.len()
        );

        self.finish(
            kind,
            baseline.len(),
            baseline_union.len() as f64,
            candidate_union.len() as f64,
            Measure::count(new),
            Measure::count(missed),
            None,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        kind: CoverageKind,
        runs: usize,
        baseline_size: f64,
        candidate_size: f64,
        new: Measure,
        missed: Measure,
        significance: Option<MannWhitney>,
    ) -> FunctionalComparison {
        let percent = |m: &Measure| {
            (self.config.percent && baseline_size > 0.0).then(|| m.scaled(100.0 / baseline_size))
        };
        FunctionalComparison {
            kind,
            mode: self.config.mode,
            runs,
            baseline_size,
            candidate_size,
            new_percent: percent(&new),
            missed_percent: percent(&missed),
            new,
            missed,
            significance,
        }
    }
}
