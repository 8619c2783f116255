#![no_main]

use libfuzzer_sys::fuzz_target;
use covdiff_bitmap::NEVER_EXECUTED;

// Fuzz target: byte-per-edge map decoding.
//
// Catches bugs in:
// - Odd and zero lengths (every length must decode)
// - Sentinel handling (0xFF never executed, everything else executed)
fuzz_target!(|data: &[u8]| {
    let edges = covdiff_bitmap::decode_edges(data).unwrap();
    let executed = data.iter().filter(|&&b| b != NEVER_EXECUTED).count();
    assert_eq!(edges.len(), executed);
    assert!(edges.iter().all(|&e| data[e as usize] != NEVER_EXECUTED));
});
