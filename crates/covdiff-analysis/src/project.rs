use std::collections::BTreeMap;

use covdiff_types::{CoverageKind, CoverageSnapshot, check_universe};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::compare::{DifferentialComparator, FunctionalComparison};
use crate::config::CompareConfig;
use crate::error::AnalysisError;
use crate::stability::FuzzerStability;

/// Every fuzzer's runs against one target binary.
///
/// Construction validates the whole project up front: each fuzzer must
/// have enough runs and every run of every fuzzer must share one line
/// universe. Later operations can then assume both.
#[derive(Clone, Debug)]
pub struct Project {
    fuzzers: BTreeMap<String, Vec<CoverageSnapshot>>,
    universe: usize,
}

/// Persisted stability of every fuzzer in a project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStability {
    /// Size of the shared line universe.
    pub universe: usize,
    pub fuzzers: BTreeMap<String, FuzzerStability>,
}

impl ProjectStability {
    /// # Errors
    ///
    /// [`AnalysisError::UnknownFuzzer`] if `name` is not in the record.
    pub fn fuzzer(&self, name: &str) -> Result<&FuzzerStability, AnalysisError> {
        self.fuzzers
            .get(name)
            .ok_or_else(|| AnalysisError::UnknownFuzzer {
                name: name.to_string(),
            })
    }
}

impl Project {
    /// Build a project from `(fuzzer name, runs)` pairs. Runs keep the
    /// order given.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::NoRuns`] if no fuzzer is given.
    /// - [`AnalysisError::NotEnoughRuns`] if a fuzzer has fewer than
    ///   `min_runs` runs (at least one is always required).
    /// - [`AnalysisError::Integrity`] if two runs disagree on the universe.
    pub fn new<I, S>(fuzzers: I, min_runs: usize) -> Result<Self, AnalysisError>
    where
        I: IntoIterator<Item = (S, Vec<CoverageSnapshot>)>,
        S: Into<String>,
    {
        let fuzzers: BTreeMap<String, Vec<CoverageSnapshot>> = fuzzers
            .into_iter()
            .map(|(name, runs)| (name.into(), runs))
            .collect();
        if fuzzers.is_empty() {
            return Err(AnalysisError::NoRuns);
        }

        let required = min_runs.max(1);
        for (name, runs) in &fuzzers {
            if runs.len() < required {
                return Err(AnalysisError::NotEnoughRuns {
                    who: name.clone(),
                    found: runs.len(),
                    required,
                });
            }
        }

        let universe = check_universe(fuzzers.values().flatten())?.map_or(0, |u| u.len());
        info!(
            "Loaded {} fuzzers, {universe} unique lines in project",
            fuzzers.len()
        );
        Ok(Self { fuzzers, universe })
    }

    pub fn fuzzers(&self) -> impl Iterator<Item = &str> {
        self.fuzzers.keys().map(String::as_str)
    }

    /// # Errors
    ///
    /// [`AnalysisError::UnknownFuzzer`] if `name` is not in the project.
    pub fn runs(&self, name: &str) -> Result<&[CoverageSnapshot], AnalysisError> {
        self.fuzzers
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| AnalysisError::UnknownFuzzer {
                name: name.to_string(),
            })
    }

    /// Size of the shared line universe.
    #[must_use]
    pub fn universe(&self) -> usize {
        self.universe
    }

    /// Kinds recorded by every run of every fuzzer.
    #[must_use]
    pub fn available_kinds(&self) -> Vec<CoverageKind> {
        CoverageKind::ALL
            .into_iter()
            .filter(|&kind| {
                self.fuzzers
                    .values()
                    .flatten()
                    .all(|run| run.has_kind(kind))
            })
            .collect()
    }

    /// Stability of every fuzzer.
    ///
    /// # Errors
    ///
    /// Propagates aggregation errors; none occur for a validated project.
    pub fn stability(&self) -> Result<ProjectStability, AnalysisError> {
        let mut fuzzers = BTreeMap::new();
        for (name, runs) in &self.fuzzers {
            info!("Computing stability of {name} over {} runs", runs.len());
            fuzzers.insert(name.clone(), FuzzerStability::from_runs(runs)?);
        }
        Ok(ProjectStability {
            universe: self.universe,
            fuzzers,
        })
    }

    /// Compare every other fuzzer against `baseline` for each of `kinds`.
    ///
    /// A fuzzer whose comparison fails is reported in the log and left out
    /// of the result; the error of the last such fuzzer is returned only if
    /// no fuzzer could be compared at all.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::UnknownFuzzer`] if `baseline` is not in the project.
    /// - The comparison error when every candidate fails.
    pub fn compare_all(
        &self,
        baseline: &str,
        kinds: &[CoverageKind],
        config: CompareConfig,
    ) -> Result<BTreeMap<String, Vec<FunctionalComparison>>, AnalysisError> {
        let baseline_runs = self.runs(baseline)?;
        let comparator = DifferentialComparator::new(config);

        let mut results = BTreeMap::new();
        let mut last_error = None;
        for (name, runs) in self.fuzzers.iter().filter(|(n, _)| n.as_str() != baseline) {
            let compared: Result<Vec<_>, _> = kinds
                .iter()
                .map(|&kind| comparator.compare(baseline_runs, runs, kind))
                .collect();
            match compared {
                Ok(comparisons) => {
                    results.insert(name.clone(), comparisons);
                }
                Err(e) => {
                    warn!("Skipping {name}: {e}");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if results.is_empty() => Err(e),
            _ => Ok(results),
        }
    }
}
