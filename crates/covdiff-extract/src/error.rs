use std::path::PathBuf;

use covdiff_bitmap::BitmapError;
use covdiff_types::{IntegrityError, TypeError};

/// Errors that can occur while turning raw run artifacts into snapshots,
/// or while moving snapshots to and from disk.
///
/// ```text
///   ExtractError
///   ├── Bitmap(BitmapError)       ← block bitmap / edge map shape invalid
///   ├── Type(TypeError)           ← mapping record malformed, unknown block
///   ├── Integrity(IntegrityError) ← runs disagree on the line universe
///   ├── DecompressionBomb         ← zstd payload above the size limit
///   ├── Json                      ← persisted record does not parse
///   └── Io                        ← underlying file access failed
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Bitmap(#[from] BitmapError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    /// Decompressed size went past `limit` bytes before the stream ended.
    #[error("decompressed {} exceeds {limit} bytes", .path.display())]
    DecompressionBomb { path: PathBuf, limit: u64 },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
