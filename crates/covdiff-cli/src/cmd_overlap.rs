/// Implementation of `covdiff overlap`.
///
/// Prints the set overlap of two single-run snapshots of the same binary.
///
/// # Example output
///
/// ```text
/// afl-run-00.json vs libfuzzer-run-00.json
/// kind       left    right    union     both  left-only right-only
/// Lines       611      598      640      569         42         29
/// BBs         954      931     1001      884         70         47
/// ```
use std::path::Path;

use anyhow::{Context, Result};
use covdiff_analysis::{overlap, report};
use covdiff_extract::read_snapshot;
use covdiff_types::CoverageKind;

use crate::OverlapArgs;
use crate::common::{emit, parse_kinds};

/// Run the `covdiff overlap` command.
///
/// # Errors
///
/// Returns an error if a snapshot cannot be read, the snapshots come from
/// different binaries, or a requested kind is missing.
pub fn run(args: &OverlapArgs) -> Result<()> {
    let left = read_snapshot(&args.left)?;
    let right = read_snapshot(&args.right)?;

    let kinds = match &args.kinds {
        Some(s) => parse_kinds(s)?,
        None => CoverageKind::ALL
            .into_iter()
            .filter(|&k| left.has_kind(k) && right.has_kind(k))
            .collect(),
    };

    let overlaps = kinds
        .iter()
        .map(|&kind| overlap(&left, &right, kind))
        .collect::<Result<Vec<_>, _>>()
        .context("cannot compute overlap")?;

    emit(
        &report::render_overlap(&file_name(&args.left), &file_name(&args.right), &overlaps),
        None,
    )
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
