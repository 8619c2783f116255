use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use covdiff_bitmap::{BlockId, BlockSet};

use crate::error::TypeError;

/// A source location, normally `path:line`.
pub type Label = String;

/// Set of source-line labels, in lexicographic order.
pub type LineSet = BTreeSet<Label>;

/// Compile-time table mapping block ids to the source lines they cover.
///
/// The instrumentation pass emits one record per block id:
///
/// ```text
///   0=src/parse.c:10
///   1=src/parse.c:11,src/parse.c:12
///   2=
///   3=src/lex.c:7,,src/lex.c:9
/// ```
///
/// A block may carry several labels (the statements it spans) or none at
/// all (compiler-generated or inlined code without debug info). Empty
/// labels are kept in the record but never contribute a line.
///
/// The table is immutable once loaded and is shared read-only by every
/// snapshot extracted from the same binary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceMapping {
    records: BTreeMap<BlockId, Vec<Label>>,
}

impl SourceMapping {
    /// Parse the textual id→line table.
    ///
    /// Blank lines are skipped. Labels are split on `,` verbatim; no
    /// whitespace trimming is applied to them.
    ///
    /// # Errors
    ///
    /// [`TypeError::MalformedRecord`] when a line has no `=`, the id is not
    /// a `u32`, or an id appears twice.
    pub fn parse(text: &str) -> Result<Self, TypeError> {
        let mut records = BTreeMap::new();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let record = raw.strip_suffix('\r').unwrap_or(raw);
            if record.trim().is_empty() {
                continue;
            }

            let (id, labels) = record
                .split_once('=')
                .ok_or_else(|| malformed(line, "missing '=' separator".to_string()))?;
            let id: BlockId = id
                .trim()
                .parse()
                .map_err(|_| malformed(line, format!("block id {id:?} is not a u32")))?;

            match records.entry(id) {
                Entry::Occupied(_) => {
                    return Err(malformed(line, format!("duplicate block id {id}")));
                }
                Entry::Vacant(slot) => {
                    slot.insert(labels.split(',').map(str::to_string).collect());
                }
            }
        }

        Ok(Self { records })
    }

    /// Build a table from already-split records. Later duplicates replace
    /// earlier ones.
    pub fn from_records<I, L>(records: I) -> Self
    where
        I: IntoIterator<Item = (BlockId, Vec<L>)>,
        L: Into<Label>,
    {
        Self {
            records: records
                .into_iter()
                .map(|(id, labels)| (id, labels.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }

    /// Labels recorded for `id`, including empty ones.
    #[must_use]
    pub fn labels(&self, id: BlockId) -> Option<&[Label]> {
        self.records.get(&id).map(Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, id: BlockId) -> bool {
        self.records.contains_key(&id)
    }

    /// Number of block ids in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Lines covered by a set of blocks.
    ///
    /// # Errors
    ///
    /// [`TypeError::UnknownBlock`] for the first id (ascending) that the
    /// table does not contain. A missing id means the bitmap and the table
    /// were produced by different builds.
    pub fn covered_lines(&self, blocks: &BlockSet) -> Result<LineSet, TypeError> {
        let mut lines = LineSet::new();
        for &id in blocks {
            let labels = self
                .records
                .get(&id)
                .ok_or(TypeError::UnknownBlock { id })?;
            lines.extend(non_empty(labels).cloned());
        }
        Ok(lines)
    }

    /// Every line the binary can possibly cover.
    ///
    /// This depends only on the table, so it is the same for every run of
    /// the binary and serves as the denominator of coverage percentages.
    #[must_use]
    pub fn total_lines(&self) -> LineSet {
        self.records
            .values()
            .flat_map(|labels| non_empty(labels).cloned())
            .collect()
    }
}

fn non_empty(labels: &[Label]) -> impl Iterator<Item = &Label> {
    labels.iter().filter(|l| !l.is_empty())
}

fn malformed(line: usize, reason: String) -> TypeError {
    TypeError::MalformedRecord { line, reason }
}
