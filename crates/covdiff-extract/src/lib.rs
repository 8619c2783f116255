#![warn(clippy::pedantic)]

pub mod error;
pub mod extractor;
pub mod store;

pub use error::ExtractError;
pub use extractor::SnapshotExtractor;
pub use store::{
    Compression, read_bitmap, read_json, read_mapping, read_project, read_snapshot, write_json,
    write_snapshot,
};
