use covdiff_types::{CoverageKind, IntegrityError};

/// Errors that can occur while aggregating or comparing runs.
///
/// ```text
/// ┌───────────────────┬──────────────────────────────────────────────────┐
/// │ Variant           │ Cause                                            │
/// ├───────────────────┼──────────────────────────────────────────────────┤
/// │ NoRuns            │ Aggregation called with zero snapshots           │
/// │ NotEnoughRuns     │ A fuzzer has fewer runs than required            │
/// │ RunCountMismatch  │ Baseline/candidate differ under Strict policy    │
/// │ MissingKind       │ A run lacks the requested coverage kind          │
/// │ UnknownFuzzer     │ Baseline or target name not in the project       │
/// │ InvalidConfidence │ Confidence level outside (0, 1)                  │
/// │ Integrity         │ Runs disagree on the line universe               │
/// └───────────────────┴──────────────────────────────────────────────────┘
/// ```
///
/// Every variant is fatal for the fuzzer or project it concerns. The core
/// never retries; callers decide whether to skip and continue elsewhere.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("no runs to aggregate")]
    NoRuns,

    #[error("{who} has only {found} run(s), at least {required} required")]
    NotEnoughRuns {
        who: String,
        found: usize,
        required: usize,
    },

    /// Only raised under [`TruncationPolicy::Strict`](crate::TruncationPolicy::Strict).
    #[error("run count mismatch: baseline has {baseline} run(s), candidate has {candidate}")]
    RunCountMismatch { baseline: usize, candidate: usize },

    #[error("{who} run {run} has no {kind} coverage")]
    MissingKind {
        kind: CoverageKind,
        who: String,
        run: usize,
    },

    #[error("fuzzer {name:?} not found")]
    UnknownFuzzer { name: String },

    #[error("confidence level {value} is outside (0, 1)")]
    InvalidConfidence { value: f64 },

    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}
