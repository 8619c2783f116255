/// Implementation of `covdiff compare`.
///
/// Compares every fuzzer of a project against `--baseline`, per run by
/// default or on the union of all runs with `--cumulative`.
///
/// # Modes
///
/// ```text
/// ┌────────────┬──────────────────────────────────────────────────────────┐
/// │ Mode       │ Reported per kind                                        │
/// ├────────────┼──────────────────────────────────────────────────────────┤
/// │ per-run    │ mean ± std and 95 % CI of new/missed, Mann–Whitney U     │
/// │ cumulative │ new/missed counts of the unions                          │
/// └────────────┴──────────────────────────────────────────────────────────┘
/// ```
///
/// Percentages are relative to the baseline's mean per-run size (per-run)
/// or union size (cumulative). When fuzzers have different run counts the
/// longer ones are truncated with a warning, unless `--strict` is set.
use anyhow::{Context, Result};
use covdiff_analysis::{CompareConfig, CompareMode, TruncationPolicy, report};
use covdiff_extract::{Compression, write_json};

use crate::CompareArgs;
use crate::common::{emit, load_project, parse_kinds};

/// Run the `covdiff compare` command.
///
/// # Errors
///
/// Returns an error if the project cannot be loaded, the baseline is not
/// part of it, a kind is unknown or missing, or no fuzzer can be compared.
pub fn run(args: &CompareArgs) -> Result<()> {
    let project = load_project(&args.project, args.min_runs)?;
    let kinds = match &args.kinds {
        Some(s) => parse_kinds(s)?,
        None => project.available_kinds(),
    };

    let config = CompareConfig {
        mode: if args.cumulative {
            CompareMode::Cumulative
        } else {
            CompareMode::PerRun
        },
        percent: !args.no_percent,
        truncation: if args.strict {
            TruncationPolicy::Strict
        } else {
            TruncationPolicy::Truncate
        },
        min_runs: args.min_runs,
        confidence: args.confidence,
    };

    let results = project
        .compare_all(&args.baseline, &kinds, config)
        .with_context(|| format!("cannot compare against {}", args.baseline))?;

    if let Some(path) = &args.json {
        write_json(path, &results, Compression::None)?;
    }
    emit(&report::render_comparisons(&args.baseline, &results), None)
}
