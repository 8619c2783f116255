#![no_main]

use libfuzzer_sys::fuzz_target;

// Fuzz target: bit-packed block bitmap decoding.
//
// Checks that the decoded set and the popcount agree, and that every id
// points at a set bit of the input.
fuzz_target!(|data: &[u8]| {
    let Ok(blocks) = covdiff_bitmap::decode_blocks(data) else {
        return;
    };
    assert_eq!(Ok(blocks.len()), covdiff_bitmap::count_blocks(data));
    for id in blocks {
        let byte = data[id as usize / 8];
        assert_ne!(byte & (1 << (id % 8)), 0);
    }
});
