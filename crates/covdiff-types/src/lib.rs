#![warn(clippy::pedantic)]

pub mod error;
pub mod kind;
pub mod mapping;
pub mod snapshot;

pub use covdiff_bitmap::{BlockId, BlockSet, EdgeId, EdgeSet};
pub use error::{IntegrityError, TypeError};
pub use kind::CoverageKind;
pub use mapping::{Label, LineSet, SourceMapping};
pub use snapshot::{CoverageSnapshot, UniverseDigest, check_universe};
