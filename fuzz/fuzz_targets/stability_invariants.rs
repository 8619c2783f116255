#![no_main]

use std::collections::BTreeSet;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    runs: Vec<Vec<u16>>,
}

// Fuzz target: stability aggregation.
//
// For any set of runs, scores stay in 1..=10, the histogram accounts for
// every observed location, and rounding stays balanced.
fuzz_target!(|input: FuzzInput| {
    let runs: Vec<BTreeSet<u16>> = input
        .runs
        .into_iter()
        .take(64)
        .map(|r| r.into_iter().collect())
        .collect();

    let Ok(stability) = covdiff_analysis::aggregate(&runs) else {
        assert!(runs.is_empty());
        return;
    };
    assert!(stability.iter().all(|(_, s)| (1..=10).contains(&s)));
    assert_eq!(stability.histogram().total(), stability.observed());
    assert!(stability.raised().abs_diff(stability.lowered()) <= 1);
});
