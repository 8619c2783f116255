/// Implementation of `covdiff stability`.
///
/// Aggregates every fuzzer's runs into per-location stability scores,
/// prints one histogram table per requested kind and optionally writes the
/// full record (exact scores and histograms) as JSON.
///
/// # Example output
///
/// ```text
/// Lines stability (1832 lines in universe)
/// fuzzer     runs  observed     1     2     3     4     5     6     7     8     9    10
/// afl          10       702    31     9    12     4     6     3     8     5    11   613
/// libfuzzer    10       688    44    10     5     7     2     6     4     9     6   595
/// ```
///
/// Fuzzers without a kind (edges not recorded in every run) show `n/a`.
use anyhow::Result;
use covdiff_analysis::report;
use covdiff_extract::{Compression, write_json};

use crate::StabilityArgs;
use crate::common::{emit, load_project, parse_kinds};

/// Run the `covdiff stability` command.
///
/// # Errors
///
/// Returns an error if the project cannot be loaded or validated, a kind
/// name is unknown, or the record cannot be written.
pub fn run(args: &StabilityArgs) -> Result<()> {
    let kinds = parse_kinds(&args.kinds)?;
    let project = load_project(&args.project, args.min_runs)?;
    let stability = project.stability()?;

    if let Some(path) = &args.output {
        let compression = if args.compress {
            Compression::Zstd
        } else {
            Compression::None
        };
        write_json(path, &stability, compression)?;
    }

    let text = kinds
        .iter()
        .map(|&kind| report::render_histograms(&stability, kind))
        .collect::<Vec<_>>()
        .join("\n");
    emit(&text, None)
}
