use std::fs;
use std::io::{Cursor, Read as _};
use std::path::{Path, PathBuf};

use covdiff_types::{CoverageSnapshot, SourceMapping};
use log::{debug, info};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ExtractError;

/// Largest decompressed record accepted from disk (1 GiB).
///
/// A snapshot of a 2^24-block binary with every block covered serializes
/// to roughly 150 MiB of JSON, so the limit leaves ample headroom while
/// still stopping a corrupt or hostile frame from exhausting memory.
pub const MAX_DECOMPRESSED_SIZE: u64 = 1 << 30;

/// zstd frame magic number, little-endian on disk.
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Default zstd level. Level 3 keeps writes fast; the sorted integer
/// arrays in a snapshot compress well even at low levels.
const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// On-disk encoding for persisted records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Compression {
    /// Plain JSON.
    #[default]
    None,
    /// JSON inside a single zstd frame.
    Zstd,
}

/// Serialize `value` as JSON and write it to `path`.
///
/// # Errors
///
/// [`ExtractError::Json`] if serialization fails, [`ExtractError::Io`] if
/// compression or the write fails.
pub fn write_json<T: Serialize>(
    path: &Path,
    value: &T,
    compression: Compression,
) -> Result<(), ExtractError> {
    let json = serde_json::to_vec(value).map_err(|source| ExtractError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let bytes = match compression {
        Compression::None => json,
        Compression::Zstd => zstd::encode_all(Cursor::new(json), DEFAULT_COMPRESSION_LEVEL)
            .map_err(|e| ExtractError::io(path, e))?,
    };

    fs::write(path, bytes).map_err(|e| ExtractError::io(path, e))
}

/// Read a JSON record, transparently decompressing zstd files.
///
/// Compression is detected from the frame magic, not the file extension.
///
/// # Errors
///
/// [`ExtractError::Io`] on read or decompression failure,
/// [`ExtractError::DecompressionBomb`] above [`MAX_DECOMPRESSED_SIZE`], and
/// [`ExtractError::Json`] if the content does not parse as `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ExtractError> {
    let raw = fs::read(path).map_err(|e| ExtractError::io(path, e))?;
    let json = if raw.starts_with(&ZSTD_MAGIC) {
        decompress(path, &raw, MAX_DECOMPRESSED_SIZE)?
    } else {
        raw
    };

    serde_json::from_slice(&json).map_err(|source| ExtractError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Persist one run's snapshot.
///
/// # Errors
///
/// Same as [`write_json`].
pub fn write_snapshot(
    path: &Path,
    snapshot: &CoverageSnapshot,
    compression: Compression,
) -> Result<(), ExtractError> {
    write_json(path, snapshot, compression)
}

/// Load one run's snapshot. The subset invariant is re-checked while
/// deserializing.
///
/// # Errors
///
/// Same as [`read_json`].
pub fn read_snapshot(path: &Path) -> Result<CoverageSnapshot, ExtractError> {
    read_json(path)
}

/// Load and parse an id→line table.
///
/// # Errors
///
/// [`ExtractError::Io`] if the file cannot be read as UTF-8 text,
/// [`ExtractError::Type`] if a record is malformed.
pub fn read_mapping(path: &Path) -> Result<SourceMapping, ExtractError> {
    let text = fs::read_to_string(path).map_err(|e| ExtractError::io(path, e))?;
    Ok(SourceMapping::parse(&text)?)
}

/// Read a raw bitmap file.
///
/// # Errors
///
/// [`ExtractError::Io`] if the file cannot be read.
pub fn read_bitmap(path: &Path) -> Result<Vec<u8>, ExtractError> {
    fs::read(path).map_err(|e| ExtractError::io(path, e))
}

/// Load every run of every fuzzer below `dir`.
///
/// ```text
///   <dir>/
///   ├── afl/
///   │   ├── run-00.json
///   │   └── run-01.json.zst
///   └── libfuzzer/
///       └── run-00.json
/// ```
///
/// Fuzzers are returned in name order and runs in file-name order, which
/// fixes the pairing used by per-run comparison. Hidden entries and files
/// without a `.json`/`.json.zst` suffix are ignored.
///
/// # Errors
///
/// [`ExtractError::Io`] if a directory cannot be listed, plus any error of
/// [`read_snapshot`].
pub fn read_project(dir: &Path) -> Result<Vec<(String, Vec<CoverageSnapshot>)>, ExtractError> {
    let mut fuzzers = Vec::new();
    for (name, path) in sorted_entries(dir)? {
        if !path.is_dir() {
            continue;
        }
        let mut runs = Vec::new();
        for (file, run_path) in sorted_entries(&path)? {
            if run_path.is_file() && is_snapshot_file(&file) {
                debug!("loading {}", run_path.display());
                runs.push(read_snapshot(&run_path)?);
            }
        }
        info!("{name}: {} runs", runs.len());
        fuzzers.push((name, runs));
    }
    Ok(fuzzers)
}

fn is_snapshot_file(name: &str) -> bool {
    name.ends_with(".json") || name.ends_with(".json.zst")
}

/// Non-hidden entries of `dir` as `(file name, path)`, sorted by name.
fn sorted_entries(dir: &Path) -> Result<Vec<(String, PathBuf)>, ExtractError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| ExtractError::io(dir, e))? {
        let entry = entry.map_err(|e| ExtractError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') {
            entries.push((name, entry.path()));
        }
    }
    entries.sort();
    Ok(entries)
}

fn decompress(path: &Path, data: &[u8], limit: u64) -> Result<Vec<u8>, ExtractError> {
    let decoder = zstd::stream::read::Decoder::new(data).map_err(|e| ExtractError::io(path, e))?;

    let mut out = Vec::new();
    decoder
        .take(limit + 1)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::io(path, e))?;

    if out.len() as u64 > limit {
        return Err(ExtractError::DecompressionBomb {
            path: path.to_path_buf(),
            limit,
        });
    }
    Ok(out)
}
