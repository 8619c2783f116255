#![no_main]

use libfuzzer_sys::fuzz_target;

// Fuzz target: id→line table parsing.
//
// Arbitrary text must either parse or yield a MalformedRecord; a parsed
// table must map any subset of its own ids without error.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(mapping) = covdiff_types::SourceMapping::parse(text) else {
        return;
    };
    let universe = mapping.total_lines();
    let all_ids: covdiff_types::BlockSet = (0..=u32::MAX)
        .take(4096)
        .filter(|&id| mapping.contains(id))
        .collect();
    let covered = mapping.covered_lines(&all_ids).unwrap();
    assert!(covered.is_subset(&universe));
});
