//! Helpers shared by several commands.

use std::fs;
use std::io::{self, Write as _};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use covdiff_analysis::{Project, ProjectStability};
use covdiff_types::CoverageKind;

/// Parses a comma-separated list of kind names.
///
/// # Errors
///
/// Returns an error if a token is not a known kind or the list is empty.
pub fn parse_kinds(s: &str) -> Result<Vec<CoverageKind>> {
    let mut kinds: Vec<CoverageKind> = s
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(parse_kind)
        .collect::<Result<_>>()?;
    kinds.sort();
    kinds.dedup();
    if kinds.is_empty() {
        return Err(anyhow!("no coverage kind given, expected lines|bbs|edges"));
    }
    Ok(kinds)
}

/// Parses one kind name, case-insensitive.
///
/// # Errors
///
/// Returns an error for unrecognised names.
pub fn parse_kind(s: &str) -> Result<CoverageKind> {
    s.parse()
        .map_err(|_| anyhow!("unknown coverage kind {s:?}, expected lines|bbs|edges"))
}

/// Loads and validates a project directory.
///
/// # Errors
///
/// Returns an error if any snapshot fails to load, a fuzzer has too few
/// runs, or runs disagree on the line universe.
pub fn load_project(dir: &Path, min_runs: usize) -> Result<Project> {
    let fuzzers = covdiff_extract::read_project(dir)
        .with_context(|| format!("cannot load project {}", dir.display()))?;
    Project::new(fuzzers, min_runs).with_context(|| format!("invalid project {}", dir.display()))
}

/// Loads a stability record written by `covdiff stability -o`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_stability(path: &Path) -> Result<ProjectStability> {
    covdiff_extract::read_json(path)
        .with_context(|| format!("cannot load stability record {}", path.display()))
}

/// Writes `text` to `output`, or to stdout when `None`.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    if let Some(path) = output {
        fs::write(path, text.as_bytes())
            .with_context(|| format!("cannot write {}", path.display()))?;
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(text.as_bytes())
            .context("cannot write to stdout")?;
    }
    Ok(())
}
