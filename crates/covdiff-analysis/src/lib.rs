#![warn(clippy::pedantic)]

pub mod compare;
pub mod config;
pub mod error;
pub mod project;
pub mod query;
pub mod report;
pub mod stability;
pub mod stats;
pub mod summary;

mod select;

pub use compare::{
    DifferentialComparator, FunctionalComparison, Measure, Overlap, SetDiff, Spread, diff_sets,
    overlap,
};
pub use config::{CompareConfig, CompareMode, SummaryStyle, TruncationPolicy};
pub use error::AnalysisError;
pub use project::{Project, ProjectStability};
pub use stability::{FuzzerStability, Histogram, RoundDirection, RoundingBias, Stability, aggregate};
pub use stats::{ConfidenceInterval, Distribution, MannWhitney};
pub use summary::ScoreSummary;
