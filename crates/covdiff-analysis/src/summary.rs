use covdiff_types::CoverageKind;
use serde::{Deserialize, Serialize};

use crate::config::SummaryStyle;
use crate::project::ProjectStability;
use crate::stats;

/// Central tendency of one fuzzer's stability scores.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub style: SummaryStyle,
    /// Number of scored locations.
    pub observed: usize,
    pub center: f64,
    pub low: f64,
    pub high: f64,
    /// Population std for [`SummaryStyle::Mean`], mean absolute deviation
    /// for [`SummaryStyle::Median`].
    pub deviation: f64,
}

/// Summarize a sample of scores. `None` if there are none.
///
/// The mean style reports the confidence interval at `confidence`, or a
/// zero-width band for a single score. The median style reports
/// `median ± deviation / 2`.
#[must_use]
pub fn summarize(scores: &[f64], style: SummaryStyle, confidence: f64) -> Option<ScoreSummary> {
    let observed = scores.len();
    match style {
        SummaryStyle::Mean => {
            let d = stats::describe(scores, confidence)?;
            let (low, high) = d.interval.map_or((d.mean, d.mean), |ci| (ci.low, ci.high));
            Some(ScoreSummary {
                style,
                observed,
                center: d.mean,
                low,
                high,
                deviation: d.std,
            })
        }
        SummaryStyle::Median => {
            let center = stats::median(scores)?;
            let deviation = stats::mean_absolute_deviation(scores)?;
            Some(ScoreSummary {
                style,
                observed,
                center,
                low: center - deviation / 2.0,
                high: center + deviation / 2.0,
                deviation,
            })
        }
    }
}

/// Summaries of every fuzzer that has scores of `kind`, in name order.
#[must_use]
pub fn summarize_project(
    stability: &ProjectStability,
    kind: CoverageKind,
    style: SummaryStyle,
    confidence: f64,
) -> Vec<(String, ScoreSummary)> {
    stability
        .fuzzers
        .iter()
        .filter_map(|(name, s)| {
            let scores = s.score_values(kind)?;
            summarize(&scores, style, confidence).map(|summary| (name.clone(), summary))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_style_uses_interval() {
        let s = summarize(&[10.0, 10.0, 4.0, 4.0], SummaryStyle::Mean, 0.95).unwrap();
        assert_eq!(s.observed, 4);
        assert_eq!(s.center, 7.0);
        assert_eq!(s.deviation, 3.0);
        assert!(s.low < 7.0 && s.high > 7.0);
        assert!((s.center - s.low - (s.high - s.center)).abs() < 1e-9);
    }

    #[test]
    fn median_style_uses_half_deviation() {
        let s = summarize(&[1.0, 2.0, 3.0, 10.0], SummaryStyle::Median, 0.95).unwrap();
        assert_eq!(s.center, 2.5);
        // mean 4, deviations 3 2 1 6
        assert_eq!(s.deviation, 3.0);
        assert_eq!((s.low, s.high), (1.0, 4.0));
    }

    #[test]
    fn single_score_collapses_band() {
        let s = summarize(&[6.0], SummaryStyle::Mean, 0.95).unwrap();
        assert_eq!((s.low, s.center, s.high), (6.0, 6.0, 6.0));
        assert!(summarize(&[], SummaryStyle::Median, 0.95).is_none());
    }
}
