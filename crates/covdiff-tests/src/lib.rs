//! Fixtures shared by the integration tests and benchmarks.
//!
//! The small campaign below is used wherever exact numbers matter: two
//! fuzzers, two runs each, against a six-line binary.
//!
//! ```text
//!   block  line(s)              afl r0  afl r1  lf r0  lf r1
//!   0      a.c:1                  x       x       x      x
//!   1      a.c:2                  x       x
//!   2      a.c:3                          x
//!   3      b.c:10                                 x      x
//!   4      (no line info)         x
//!   5      b.c:11, b.c:12                         x
//! ```
//!
//! Edges: afl r0 {0}, afl r1 {0, 1}, libfuzzer r0 {0, 2}, libfuzzer r1 {2}.

use std::fs;
use std::path::Path;

use covdiff_bitmap::NEVER_EXECUTED;
use covdiff_extract::{Compression, ExtractError, SnapshotExtractor, write_snapshot};
use covdiff_types::{CoverageSnapshot, SourceMapping};

/// Id→line table of the fixture binary.
pub const MAPPING: &str = "0=a.c:1\n1=a.c:2\n2=a.c:3\n3=b.c:10\n4=\n5=b.c:11,b.c:12\n";

/// Block bitmap length of the fixture binary.
pub const BLOCK_BYTES: usize = 1;

/// Edge map length of the fixture binary.
pub const EDGE_BYTES: usize = 4;

/// Covered blocks and edges of one run.
#[derive(Clone, Copy, Debug)]
pub struct RunSpec {
    pub blocks: &'static [u32],
    pub edges: &'static [u32],
}

pub const CAMPAIGN: &[(&str, &[RunSpec])] = &[
    (
        "afl",
        &[
            RunSpec {
                blocks: &[0, 1, 4],
                edges: &[0],
            },
            RunSpec {
                blocks: &[0, 1, 2],
                edges: &[0, 1],
            },
        ],
    ),
    (
        "libfuzzer",
        &[
            RunSpec {
                blocks: &[0, 3, 5],
                edges: &[0, 2],
            },
            RunSpec {
                blocks: &[0, 3],
                edges: &[2],
            },
        ],
    ),
];

/// Bit-packed block bitmap of `bytes` bytes with `blocks` set.
///
/// # Panics
///
/// If a block does not fit in `bytes`.
#[must_use]
pub fn block_bitmap(blocks: &[u32], bytes: usize) -> Vec<u8> {
    let mut buf = vec![0u8; bytes];
    for &b in blocks {
        buf[b as usize / 8] |= 1 << (b % 8);
    }
    buf
}

/// Byte-per-edge map of `bytes` bytes with `edges` executed once.
///
/// # Panics
///
/// If an edge does not fit in `bytes`.
#[must_use]
pub fn edge_map(edges: &[u32], bytes: usize) -> Vec<u8> {
    let mut buf = vec![NEVER_EXECUTED; bytes];
    for &e in edges {
        buf[e as usize] = 0x01;
    }
    buf
}

/// Extract one run of the fixture campaign.
///
/// # Errors
///
/// Propagates extraction errors.
pub fn extract_run(mapping: &SourceMapping, run: &RunSpec) -> Result<CoverageSnapshot, ExtractError> {
    SnapshotExtractor::new(mapping).extract(
        &block_bitmap(run.blocks, BLOCK_BYTES),
        Some(&edge_map(run.edges, EDGE_BYTES)),
    )
}

/// Extract the fixture campaign into `dir` as a project directory
/// (`<dir>/<fuzzer>/run-NN.json`).
///
/// # Errors
///
/// Propagates extraction and I/O errors.
pub fn write_campaign(dir: &Path) -> Result<(), ExtractError> {
    let mapping = SourceMapping::parse(MAPPING)?;
    for (fuzzer, runs) in CAMPAIGN {
        let fuzzer_dir = dir.join(fuzzer);
        fs::create_dir_all(&fuzzer_dir).map_err(|source| ExtractError::Io {
            path: fuzzer_dir.clone(),
            source,
        })?;
        for (i, run) in runs.iter().enumerate() {
            let snapshot = extract_run(&mapping, run)?;
            write_snapshot(
                &fuzzer_dir.join(format!("run-{i:02}.json")),
                &snapshot,
                Compression::None,
            )?;
        }
    }
    Ok(())
}

/// Deterministic xorshift generator for benchmark inputs.
#[derive(Clone, Debug)]
pub struct XorShift(u64);

impl XorShift {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// True with probability `percent / 100`.
    pub fn chance(&mut self, percent: u64) -> bool {
        self.next_u64() % 100 < percent
    }
}

/// Block bitmap of `bytes` bytes with roughly `percent` of bits set.
#[must_use]
pub fn random_block_bitmap(rng: &mut XorShift, bytes: usize, percent: u64) -> Vec<u8> {
    (0..bytes)
        .map(|_| {
            (0..8).fold(0u8, |acc, bit| {
                if rng.chance(percent) { acc | (1 << bit) } else { acc }
            })
        })
        .collect()
}

/// Edge map of `bytes` bytes with roughly `percent` of edges executed.
#[must_use]
pub fn random_edge_map(rng: &mut XorShift, bytes: usize, percent: u64) -> Vec<u8> {
    (0..bytes)
        .map(|_| if rng.chance(percent) { 0x01 } else { NEVER_EXECUTED })
        .collect()
}
