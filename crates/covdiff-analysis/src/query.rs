//! Locations one fuzzer reaches that others do not, or reaches more
//! reliably.

use std::collections::BTreeMap;
use std::fmt::Display;

use covdiff_types::{CoverageKind, EdgeId};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::project::ProjectStability;
use crate::stability::{FuzzerStability, Stability};

/// Which locations of the target to keep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Query {
    /// Observed by the target and by no contender.
    Unique,
    /// The target's score beats every contender that observed the location
    /// by at least `diff`. Locations no contender observed always qualify.
    Best { diff: i16 },
}

/// Target locations no contender observed, with the target's score.
pub fn unique<'a, L>(
    target: &Stability<L>,
    contenders: impl IntoIterator<Item = &'a Stability<L>>,
) -> BTreeMap<L, u8>
where
    L: Ord + Clone + 'a,
{
    retain(target, contenders, |_, _| false)
}

/// Target locations whose score is at least `diff` above every
/// contender's score for the same location.
pub fn best<'a, L>(
    target: &Stability<L>,
    contenders: impl IntoIterator<Item = &'a Stability<L>>,
    diff: i16,
) -> BTreeMap<L, u8>
where
    L: Ord + Clone + 'a,
{
    retain(target, contenders, |mine, theirs| {
        i16::from(theirs) <= i16::from(mine) - diff
    })
}

/// Keep target locations that every contender either missed or loses
/// to according to `beats(target_score, contender_score)`.
fn retain<'a, L>(
    target: &Stability<L>,
    contenders: impl IntoIterator<Item = &'a Stability<L>>,
    beats: impl Fn(u8, u8) -> bool,
) -> BTreeMap<L, u8>
where
    L: Ord + Clone + 'a,
{
    let contenders: Vec<&Stability<L>> = contenders.into_iter().collect();
    target
        .iter()
        .filter(|&(location, score)| {
            contenders
                .iter()
                .all(|c| c.score(location).is_none_or(|other| beats(score, other)))
        })
        .map(|(location, score)| (location.clone(), score))
        .collect()
}

/// Run `query` for `target` against `contenders` (every other fuzzer when
/// empty) and render locations as strings.
///
/// # Errors
///
/// - [`AnalysisError::UnknownFuzzer`] for a target or contender not in
///   the record.
/// - [`AnalysisError::MissingKind`] if `kind` is edges and a participant
///   has no edge stability.
pub fn run(
    stability: &ProjectStability,
    target: &str,
    contenders: &[String],
    kind: CoverageKind,
    query: Query,
) -> Result<Vec<(String, u8)>, AnalysisError> {
    fn select<L: Ord + Clone + Display>(
        target: &Stability<L>,
        others: &[&Stability<L>],
        query: Query,
    ) -> Vec<(String, u8)> {
        let others = others.iter().copied();
        let kept = match query {
            Query::Unique => unique(target, others),
            Query::Best { diff } => best(target, others, diff),
        };
        kept.into_iter().map(|(l, s)| (l.to_string(), s)).collect()
    }

    fn edges<'s>(name: &str, s: &'s FuzzerStability) -> Result<&'s Stability<EdgeId>, AnalysisError> {
        s.edges.as_ref().ok_or_else(|| AnalysisError::MissingKind {
            kind: CoverageKind::Edges,
            who: name.to_string(),
            run: 0,
        })
    }

    let target_stability = stability.fuzzer(target)?;
    let others: Vec<(&str, &FuzzerStability)> = if contenders.is_empty() {
        stability
            .fuzzers
            .iter()
            .filter(|(name, _)| name.as_str() != target)
            .map(|(name, s)| (name.as_str(), s))
            .collect()
    } else {
        contenders
            .iter()
            .map(|name| stability.fuzzer(name).map(|s| (name.as_str(), s)))
            .collect::<Result<_, _>>()?
    };

    Ok(match kind {
        CoverageKind::Lines => {
            let others: Vec<_> = others.iter().map(|(_, s)| &s.lines).collect();
            select(&target_stability.lines, &others, query)
        }
        CoverageKind::Blocks => {
            let others: Vec<_> = others.iter().map(|(_, s)| &s.blocks).collect();
            select(&target_stability.blocks, &others, query)
        }
        CoverageKind::Edges => {
            let target_edges = edges(target, target_stability)?;
            let others = others
                .iter()
                .map(|(name, s)| edges(name, s))
                .collect::<Result<Vec<_>, _>>()?;
            select(target_edges, &others, query)
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::stability::aggregate;

    fn stability(runs: &[&[u32]]) -> Stability<u32> {
        let sets: Vec<BTreeSet<u32>> = runs.iter().map(|r| r.iter().copied().collect()).collect();
        aggregate(&sets).unwrap()
    }

    #[test]
    fn unique_excludes_anything_a_contender_saw() {
        let target = stability(&[&[1, 2, 3], &[1, 2]]);
        let a = stability(&[&[2], &[]]);
        let b = stability(&[&[9], &[9]]);
        let u = unique(&target, [&a, &b]);
        assert_eq!(u.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(u[&1], 10);
        assert_eq!(u[&3], 5);
    }

    #[test]
    fn best_compares_scores_with_margin() {
        let target = stability(&[&[1, 2, 3], &[1, 2, 3]]); // all 10
        let other = stability(&[&[1, 2], &[1]]); // 1 → 10, 2 → 5
        let b = best(&target, [&other], 3);
        // 1: 10 ≤ 10-3? no. 2: 5 ≤ 7 yes. 3: unseen.
        assert_eq!(b.keys().copied().collect::<Vec<_>>(), vec![2, 3]);

        let b0 = best(&target, [&other], 0);
        assert_eq!(b0.len(), 3);
    }

    #[test]
    fn unique_is_subset_of_best() {
        let target = stability(&[&[1, 2, 3, 4], &[1, 4]]);
        let other = stability(&[&[1, 5], &[2]]);
        let u = unique(&target, [&other]);
        let b = best(&target, [&other], 0);
        assert!(u.keys().all(|k| b.contains_key(k)));
    }

    #[test]
    fn no_contenders_means_everything_is_unique() {
        let target = stability(&[&[4, 5]]);
        let none: [&Stability<u32>; 0] = [];
        assert_eq!(unique(&target, none).len(), 2);
    }

    #[test]
    fn run_resolves_contenders_by_name() {
        use crate::project::Project;
        use crate::testutil::run as snap;

        let project = Project::new(
            [
                ("afl", vec![snap(&[1, 2], Some(&[7])), snap(&[1], Some(&[7]))]),
                ("honggfuzz", vec![snap(&[1], Some(&[8])), snap(&[1], Some(&[8]))]),
            ],
            1,
        )
        .unwrap();
        let stability = project.stability().unwrap();

        let found = run(&stability, "afl", &[], CoverageKind::Blocks, Query::Unique).unwrap();
        assert_eq!(found, vec![("2".to_string(), 5)]);

        let found = run(&stability, "afl", &["honggfuzz".into()], CoverageKind::Edges, Query::Unique)
            .unwrap();
        assert_eq!(found, vec![("7".to_string(), 10)]);

        assert!(matches!(
            run(&stability, "afl", &["nobody".into()], CoverageKind::Lines, Query::Unique),
            Err(AnalysisError::UnknownFuzzer { .. })
        ));
    }
}
