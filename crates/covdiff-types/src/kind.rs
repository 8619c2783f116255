use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The three granularities at which coverage is measured.
///
/// ```text
/// ┌────────┬────────────┬──────────────────────────────────────────┐
/// │ Kind   │ Location   │ Source                                   │
/// ├────────┼────────────┼──────────────────────────────────────────┤
/// │ Lines  │ "file:42"  │ blocks mapped through the id→line table  │
/// │ Blocks │ u32        │ bit position in the block bitmap         │
/// │ Edges  │ u32        │ byte offset in the edge map              │
/// └────────┴────────────┴──────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CoverageKind {
    Lines,
    #[serde(rename = "BBs")]
    Blocks,
    Edges,
}

impl CoverageKind {
    /// Every kind, in report order.
    pub const ALL: [CoverageKind; 3] = [Self::Lines, Self::Blocks, Self::Edges];

    /// Short display name used in reports and JSON.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Lines => "Lines",
            Self::Blocks => "BBs",
            Self::Edges => "Edges",
        }
    }
}

impl fmt::Display for CoverageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CoverageKind {
    type Err = TypeError;

    /// Case-insensitive. Accepts `lines`, `bbs`/`blocks`, `edges`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lines" | "line" => Ok(Self::Lines),
            "bbs" | "bb" | "blocks" | "block" => Ok(Self::Blocks),
            "edges" | "edge" => Ok(Self::Edges),
            _ => Err(TypeError::UnknownKind { name: s.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cli_spellings() {
        assert_eq!("Lines".parse::<CoverageKind>().unwrap(), CoverageKind::Lines);
        assert_eq!("bbs".parse::<CoverageKind>().unwrap(), CoverageKind::Blocks);
        assert_eq!("EDGES".parse::<CoverageKind>().unwrap(), CoverageKind::Edges);
    }

    #[test]
    fn rejects_unknown_name() {
        assert!(matches!(
            "functions".parse::<CoverageKind>(),
            Err(TypeError::UnknownKind { .. })
        ));
    }

    #[test]
    fn serializes_blocks_as_bbs() {
        let json = serde_json::to_string(&CoverageKind::Blocks).unwrap();
        assert_eq!(json, "\"BBs\"");
        let back: CoverageKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CoverageKind::Blocks);
    }
}
