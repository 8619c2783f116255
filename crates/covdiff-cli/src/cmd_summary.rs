/// Implementation of `covdiff summary`.
///
/// Summarizes each fuzzer's stability scores of one kind.
///
/// # Example output
///
/// ```text
/// Lines stability summary (mean)
/// fuzzer     observed  center     low    high deviation
/// afl             702    9.12    8.93    9.31      2.51
/// libfuzzer       688    8.97    8.76    9.18      2.84
/// ```
use anyhow::{Result, anyhow};
use covdiff_analysis::{SummaryStyle, report, summary};

use crate::SummaryArgs;
use crate::common::{emit, load_stability, parse_kind};

/// Run the `covdiff summary` command.
///
/// # Errors
///
/// Returns an error if the record cannot be read or a flag value is
/// unrecognised.
pub fn run(args: &SummaryArgs) -> Result<()> {
    let stability = load_stability(&args.stability)?;
    let kind = parse_kind(&args.kind)?;
    let style = parse_style(&args.style)?;

    let rows = summary::summarize_project(&stability, kind, style, args.confidence);
    emit(&report::render_summaries(kind, style, &rows), None)
}

/// Parses the `--style` string to a [`SummaryStyle`].
///
/// # Errors
///
/// Returns an error for unrecognised style names.
fn parse_style(s: &str) -> Result<SummaryStyle> {
    match s.to_lowercase().as_str() {
        "mean" => Ok(SummaryStyle::Mean),
        "median" => Ok(SummaryStyle::Median),
        _ => Err(anyhow!("unknown style {s:?}, expected mean|median")),
    }
}
