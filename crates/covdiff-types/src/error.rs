use covdiff_bitmap::BlockId;

/// Errors raised by the mapping table and snapshot types.
///
/// ```text
/// ┌──────────────────────────┬────────────────────────────────────────────┐
/// │ Variant                  │ Cause                                      │
/// ├──────────────────────────┼────────────────────────────────────────────┤
/// │ MalformedRecord          │ id→line record cannot be parsed            │
/// │ UnknownBlock             │ covered block id absent from the table     │
/// │ LinesOutsideUniverse     │ snapshot covers lines it does not declare  │
/// │ UnknownKind              │ coverage kind name not recognised          │
/// └──────────────────────────┴────────────────────────────────────────────┘
/// ```
///
/// `MalformedRecord` is a format problem with the table file itself. The
/// other two mean that a bitmap and a table come from different builds of
/// the binary, and no meaningful snapshot can be produced from them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// A line of the id→line table did not match `<blockid>=<labels>`.
    ///
    /// `line` is 1-based, matching what an editor shows.
    #[error("malformed mapping record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// The bitmap reports a block the table has never heard of.
    #[error("block {id} is covered but missing from the mapping table")]
    UnknownBlock { id: BlockId },

    /// `covered_lines` is not a subset of `total_lines`.
    #[error("{count} covered line(s) are outside the line universe")]
    LinesOutsideUniverse { count: usize },

    #[error("unknown coverage kind {name:?}, expected lines|bbs|edges")]
    UnknownKind { name: String },
}

/// Two snapshots that should describe the same binary disagree on the line
/// universe.
///
/// Every run of every fuzzer in a project is measured against the same
/// compiled binary, so `total_lines` must be identical everywhere. A
/// mismatch means runs from different builds were mixed, and any
/// comparison across them would be meaningless.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    /// `index` is the position of the offending snapshot in the checked
    /// sequence; digests are shortened BLAKE3 fingerprints of the universes.
    #[error(
        "line universe mismatch at run {index}: expected {expected} ({expected_len} lines), found {found} ({found_len} lines)"
    )]
    UniverseMismatch {
        index: usize,
        expected: String,
        expected_len: usize,
        found: String,
        found_len: usize,
    },
}
