/// Implementation of `covdiff unique`.
///
/// Lists locations of one fuzzer's stability record, one
/// `location<TAB>score` pair per line:
///
/// ```text
/// parser.c:118	10
/// parser.c:121	7
/// ```
use anyhow::{Context, Result};
use covdiff_analysis::query::{self, Query};
use covdiff_analysis::report;
use log::info;

use crate::UniqueArgs;
use crate::common::{emit, load_stability, parse_kind};

/// Run the `covdiff unique` command.
///
/// # Errors
///
/// Returns an error if the record cannot be read, a fuzzer name is
/// unknown, or the kind is not recorded for every participant.
pub fn run(args: &UniqueArgs) -> Result<()> {
    let stability = load_stability(&args.stability)?;
    let kind = parse_kind(&args.kind)?;
    let query = if args.best {
        Query::Best { diff: args.diff }
    } else {
        Query::Unique
    };

    let rows = query::run(&stability, &args.fuzzer, &args.contender, kind, query)
        .with_context(|| format!("cannot query {}", args.fuzzer))?;
    info!("{} {kind} locations selected for {}", rows.len(), args.fuzzer);

    emit(&report::render_locations(&rows), args.output.as_deref())
}
