//! Plain-text rendering of analysis results.
//!
//! Output is deterministic: fuzzers appear in name order, kinds in
//! [`CoverageKind::ALL`] order, and every float has a fixed precision.
//!
//! ```text
//! == libfuzzer vs afl ==
//! Lines (cumulative, 2 runs)
//!   baseline   3
//!   candidate  3
//!   new        1  (33.33%)
//!   missed     1  (33.33%)
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;

use covdiff_types::CoverageKind;

use crate::compare::{FunctionalComparison, Measure, Overlap, Spread};
use crate::config::{CompareMode, SummaryStyle};
use crate::project::ProjectStability;
use crate::summary::ScoreSummary;

/// One block per candidate, one section per kind.
#[must_use]
pub fn render_comparisons(
    baseline: &str,
    results: &BTreeMap<String, Vec<FunctionalComparison>>,
) -> String {
    let mut out = String::new();
    for (i, (candidate, comparisons)) in results.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "== {candidate} vs {baseline} ==");
        for c in comparisons {
            render_comparison(&mut out, c);
        }
    }
    out
}

fn render_comparison(out: &mut String, c: &FunctionalComparison) {
    let mode = match c.mode {
        CompareMode::PerRun => "per-run",
        CompareMode::Cumulative => "cumulative",
    };
    let _ = writeln!(out, "{} ({mode}, {} runs)", c.kind, c.runs);
    let size = |v: f64| match c.mode {
        CompareMode::PerRun => format!("{v:.2}"),
        CompareMode::Cumulative => format!("{v:.0}"),
    };
    let _ = writeln!(out, "  baseline   {}", size(c.baseline_size));
    let _ = writeln!(out, "  candidate  {}", size(c.candidate_size));
    let _ = writeln!(out, "  new        {}", measure(&c.new, c.new_percent.as_ref()));
    let _ = writeln!(out, "  missed     {}", measure(&c.missed, c.missed_percent.as_ref()));
    if let Some(mw) = c.significance {
        let _ = writeln!(out, "  mann-whitney U={:.1} p={:.4}", mw.u, mw.p_value);
    }
}

fn measure(m: &Measure, percent: Option<&Measure>) -> String {
    let mut s = match m.spread {
        Spread::NotApplicable => format!("{:.0}", m.value),
        Spread::Distribution { std, interval } => {
            let mut s = format!("{:.2} ± {std:.2}", m.value);
            if let Some(ci) = interval {
                let _ = write!(s, "  CI [{:.2}, {:.2}]", ci.low, ci.high);
            }
            s
        }
    };
    if let Some(p) = percent {
        let _ = write!(s, "  ({:.2}%)", p.value);
    }
    s
}

/// Score histogram of `kind` for every fuzzer.
#[must_use]
pub fn render_histograms(stability: &ProjectStability, kind: CoverageKind) -> String {
    let width = name_width(stability.fuzzers.keys().map(String::as_str));
    let mut out = String::new();
    let _ = writeln!(out, "{kind} stability ({} lines in universe)", stability.universe);
    let _ = write!(out, "{:<width$} {:>5} {:>9}", "fuzzer", "runs", "observed");
    for score in 1..=10 {
        let _ = write!(out, " {score:>5}");
    }
    out.push('\n');

    for (name, s) in &stability.fuzzers {
        let _ = write!(out, "{name:<width$} {:>5}", s.runs);
        match s.histogram(kind) {
            Some(h) => {
                let _ = write!(out, " {:>9}", h.total());
                for (_, count) in h.iter() {
                    let _ = write!(out, " {count:>5}");
                }
            }
            None => {
                let _ = write!(out, " {:>9}", "n/a");
            }
        }
        out.push('\n');
    }
    out
}

/// Overlap of two runs, one row per kind.
#[must_use]
pub fn render_overlap(left: &str, right: &str, overlaps: &[Overlap]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{left} vs {right}");
    let _ = writeln!(
        out,
        "{:<6} {:>8} {:>8} {:>8} {:>8} {:>10} {:>10}",
        "kind", "left", "right", "union", "both", "left-only", "right-only"
    );
    for o in overlaps {
        let _ = writeln!(
            out,
            "{:<6} {:>8} {:>8} {:>8} {:>8} {:>10} {:>10}",
            o.kind.name(),
            o.left,
            o.right,
            o.union,
            o.intersection,
            o.left_only,
            o.right_only
        );
    }
    out
}

/// Score summaries of `kind`, one row per fuzzer.
#[must_use]
pub fn render_summaries(
    kind: CoverageKind,
    style: SummaryStyle,
    rows: &[(String, ScoreSummary)],
) -> String {
    let style = match style {
        SummaryStyle::Mean => "mean",
        SummaryStyle::Median => "median",
    };
    let width = name_width(rows.iter().map(|(n, _)| n.as_str()));
    let mut out = String::new();
    let _ = writeln!(out, "{kind} stability summary ({style})");
    let _ = writeln!(
        out,
        "{:<width$} {:>9} {:>7} {:>7} {:>7} {:>9}",
        "fuzzer", "observed", "center", "low", "high", "deviation"
    );
    for (name, s) in rows {
        let _ = writeln!(
            out,
            "{name:<width$} {:>9} {:>7.2} {:>7.2} {:>7.2} {:>9.2}",
            s.observed, s.center, s.low, s.high, s.deviation
        );
    }
    out
}

/// `location<TAB>score` lines.
#[must_use]
pub fn render_locations(rows: &[(String, u8)]) -> String {
    let mut out = String::new();
    for (location, score) in rows {
        let _ = writeln!(out, "{location}\t{score}");
    }
    out
}

fn name_width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names.map(str::len).max().unwrap_or(0).max("fuzzer".len())
}
