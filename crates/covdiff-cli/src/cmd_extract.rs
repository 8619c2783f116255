/// Implementation of `covdiff extract`.
///
/// Reads the mapping table and one run's bitmaps, builds the run's
/// coverage snapshot and writes it as JSON (optionally zstd-compressed).
///
/// # Example output (with `-v`)
///
/// ```text
/// [INFO  covdiff_extract::extractor] Unique lines in project: 1832
/// [INFO  covdiff_extract::extractor] Lines visited: 611, 0.333515
/// [INFO  covdiff_extract::extractor] BB visited: 954
/// [INFO  covdiff_extract::extractor] Edges visited: 1407
/// ```
use anyhow::{Context, Result};
use covdiff_bitmap::BitmapShape;
use covdiff_extract::{Compression, SnapshotExtractor, read_bitmap, read_mapping, write_snapshot};
use log::info;

use crate::ExtractArgs;

/// Run the `covdiff extract` command.
///
/// # Errors
///
/// Returns an error if an input cannot be read, a bitmap has an
/// unsupported or unexpected length, a covered block is missing from the
/// mapping table, or the snapshot cannot be written.
pub fn run(args: &ExtractArgs) -> Result<()> {
    let mapping = read_mapping(&args.mapping)?;
    let blocks = read_bitmap(&args.blocks)?;
    let edges = args.edges.as_deref().map(read_bitmap).transpose()?;

    let shape = BitmapShape {
        block_bytes: args.block_bytes,
        edge_bytes: args.edge_bytes,
    };
    let snapshot = SnapshotExtractor::new(&mapping)
        .with_shape(shape)
        .extract(&blocks, edges.as_deref())
        .with_context(|| format!("cannot extract coverage from {}", args.blocks.display()))?;

    let compression = if args.compress {
        Compression::Zstd
    } else {
        Compression::None
    };
    write_snapshot(&args.output, &snapshot, compression)?;
    info!("Snapshot written to {}", args.output.display());
    Ok(())
}
