use serde::{Deserialize, Serialize};

/// Configuration for differential comparison.
///
/// ```text
/// ┌────────────┬───────────────────────────────────────────────────────┐
/// │ Field      │ Purpose                                               │
/// ├────────────┼───────────────────────────────────────────────────────┤
/// │ mode       │ Pair runs one by one, or union them first             │
/// │ percent    │ Also report values relative to the baseline size      │
/// │ truncation │ What to do when the two sides have different N        │
/// │ min_runs   │ Minimum runs each side must provide                   │
/// │ confidence │ Two-sided confidence level for per-run intervals      │
/// └────────────┴───────────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompareConfig {
    pub mode: CompareMode,
    pub percent: bool,
    pub truncation: TruncationPolicy,
    pub min_runs: usize,
    pub confidence: f64,
}

impl Default for CompareConfig {
    /// Per-run comparison with percentages, truncation to the shorter side,
    /// at least one run, 95 % intervals.
    fn default() -> Self {
        Self {
            mode: CompareMode::PerRun,
            percent: true,
            truncation: TruncationPolicy::Truncate,
            min_runs: 1,
            confidence: 0.95,
        }
    }
}

/// How runs of the two fuzzers are matched.
///
/// ```text
/// ┌────────────┬─────────────────────────────────────────────────────┐
/// │ Mode       │ Behavior                                            │
/// ├────────────┼─────────────────────────────────────────────────────┤
/// │ PerRun     │ Run i vs run i; mean, std, CI, Mann–Whitney U       │
/// │ Cumulative │ Union of all runs vs union; bare counts, no spread  │
/// └────────────┴─────────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareMode {
    #[default]
    PerRun,
    Cumulative,
}

/// Policy when baseline and candidate provide different numbers of runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TruncationPolicy {
    /// Keep the first `min(n_baseline, n_candidate)` runs of each side and
    /// log a warning.
    #[default]
    Truncate,
    /// Fail with [`AnalysisError::RunCountMismatch`](crate::AnalysisError::RunCountMismatch).
    Strict,
}

/// Central tendency used when summarizing stability scores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryStyle {
    /// Mean with a Student-t confidence interval.
    #[default]
    Mean,
    /// Median with `± deviation / 2`.
    Median,
}
