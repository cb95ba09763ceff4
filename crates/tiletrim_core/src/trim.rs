//! The trim operation: select, deduplicate, remap, and copy.

use crate::dedup::RangeCollector;
use crate::error::{TrimError, TrimResult};
use crate::normalize::EntryNormalizer;
use crate::plan::CompactionPlan;
use tiletrim_format::{
    build_directories, decode_metadata, each_entry, encode_metadata, zoom_cutoff, Entry, Header,
    DEFAULT_ROOT_BUDGET, HEADER_LEN, MAX_ZOOM,
};
use tiletrim_storage::StorageBackend;
use tracing::debug;

/// Options for one trim operation.
#[derive(Debug, Clone, Copy)]
pub struct TrimOptions {
    /// Highest zoom level to keep.
    pub max_zoom: u8,
    /// Byte budget for the compressed root directory block.
    pub root_budget: usize,
}

impl TrimOptions {
    /// Creates options keeping tiles up to `max_zoom`, with the default
    /// root directory budget.
    #[must_use]
    pub fn new(max_zoom: u8) -> Self {
        Self {
            max_zoom,
            root_budget: DEFAULT_ROOT_BUDGET,
        }
    }
}

/// Summary of a completed trim operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimSummary {
    /// Highest zoom level present in the output.
    pub max_zoom: u8,
    /// Directory entries retained.
    pub tile_entries: u64,
    /// Distinct tile byte spans retained.
    pub tile_contents: u64,
    /// Tiles addressed by the retained entries, runs expanded.
    pub addressed_tiles: u64,
    /// Byte length of the output tile data region.
    pub tile_data_length: u64,
}

/// Trims the source archive down to `options.max_zoom`, writing a
/// self-contained archive to `dest`.
///
/// The operation is strictly two-pass. Pass one streams the source
/// directory in tile-identifier order, normalizing each entry against
/// the zoom cutoff and collecting the distinct byte ranges. Pass two
/// packs those ranges into a gapless output region, rewrites the
/// retained entries, rebuilds the directory tree and header, and copies
/// the tile bytes range by range in compaction order.
///
/// # Errors
///
/// Fails on unreadable or non-clustered sources, an out-of-range zoom,
/// entries whose byte ranges fit neither offset interpretation, and any
/// storage error. Every failure aborts the whole operation; a partially
/// written destination is not valid output.
pub fn trim(
    source: &dyn StorageBackend,
    dest: &mut dyn StorageBackend,
    options: TrimOptions,
) -> TrimResult<TrimSummary> {
    if options.max_zoom > MAX_ZOOM {
        return Err(TrimError::ZoomOutOfRange {
            requested: options.max_zoom,
        });
    }

    let header = Header::decode(&source.read_at(0, HEADER_LEN)?)?;
    if !header.clustered {
        return Err(TrimError::NotClustered);
    }

    let cutoff = zoom_cutoff(options.max_zoom);
    let normalizer = EntryNormalizer::new(cutoff, header.tile_data_offset, header.tile_data_length);
    let mut collector = RangeCollector::new();

    each_entry(
        &header,
        &mut |offset, len| -> TrimResult<Vec<u8>> { Ok(source.read_at(offset, len)?) },
        &mut |entry: &Entry| -> TrimResult<()> {
            if let Some(normalized) = normalizer.normalize(entry)? {
                collector.admit(normalized);
            }
            Ok(())
        },
    )?;

    debug!(
        entries = collector.entry_count(),
        cutoff, "source directory pass complete"
    );

    let (mut entries, ranges, addressed_tiles) = collector.into_parts();
    let plan = CompactionPlan::build(ranges);
    plan.rewrite(&mut entries)?;

    let metadata_block = source.read_at(header.metadata_offset, header.metadata_length as usize)?;
    let document = decode_metadata(&metadata_block, header.internal_compression)?;
    let metadata = encode_metadata(&document, header.internal_compression)?;

    let (root, leaves) =
        build_directories(&entries, options.root_budget, header.internal_compression)?;

    let max_zoom = header.max_zoom.min(options.max_zoom);
    let mut out = header.clone();
    out.max_zoom = max_zoom;
    out.center_zoom = header.center_zoom.min(max_zoom);
    out.addressed_tiles = addressed_tiles;
    out.tile_entries = entries.len() as u64;
    out.tile_contents = plan.ranges().len() as u64;
    out.root_dir_offset = HEADER_LEN as u64;
    out.root_dir_length = root.len() as u64;
    out.metadata_offset = out.root_dir_offset + out.root_dir_length;
    out.metadata_length = metadata.len() as u64;
    out.leaf_dirs_offset = out.metadata_offset + out.metadata_length;
    out.leaf_dirs_length = leaves.len() as u64;
    out.tile_data_offset = out.leaf_dirs_offset + out.leaf_dirs_length;
    out.tile_data_length = plan.total_length();

    dest.append(&out.encode())?;
    dest.append(&root)?;
    dest.append(&metadata)?;
    dest.append(&leaves)?;
    for range in plan.ranges() {
        let bytes = source.read_at(
            header.tile_data_offset + range.source_offset,
            range.length as usize,
        )?;
        dest.append(&bytes)?;
    }
    dest.sync()?;

    debug!(
        tile_entries = entries.len(),
        tile_contents = plan.ranges().len(),
        tile_data_length = plan.total_length(),
        "destination archive assembled"
    );

    Ok(TrimSummary {
        max_zoom,
        tile_entries: entries.len() as u64,
        tile_contents: plan.ranges().len() as u64,
        addressed_tiles,
        tile_data_length: plan.total_length(),
    })
}
