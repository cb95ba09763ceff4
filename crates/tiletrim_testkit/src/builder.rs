//! In-memory construction of valid clustered archives.

use serde_json::json;
use std::collections::HashMap;
use tiletrim_format::{
    build_directories, encode_metadata, Compression, Entry, FormatResult, Header, TileType,
    DEFAULT_ROOT_BUDGET, HEADER_LEN,
};
use tiletrim_storage::MemoryBackend;

/// Builds complete archives from tile payloads, the way a real writer
/// would: payloads are deduplicated by content, entries sorted by tile
/// identifier, offsets assigned in first-use order so the result is
/// clustered.
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    tiles: Vec<(u64, u32, Vec<u8>)>,
    raw_entries: Vec<Entry>,
    metadata: serde_json::Value,
    internal_compression: Compression,
    tile_compression: Compression,
    tile_type: TileType,
    min_zoom: u8,
    max_zoom: u8,
    center_zoom: u8,
    clustered: bool,
    root_budget: usize,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self {
            tiles: Vec::new(),
            raw_entries: Vec::new(),
            metadata: json!({"name": "testkit archive"}),
            internal_compression: Compression::Gzip,
            tile_compression: Compression::None,
            tile_type: TileType::Png,
            min_zoom: 0,
            max_zoom: 3,
            center_zoom: 0,
            clustered: true,
            root_budget: DEFAULT_ROOT_BUDGET,
        }
    }
}

impl ArchiveBuilder {
    /// Creates a builder with gzip internal compression and a small
    /// default zoom range.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single tile.
    #[must_use]
    pub fn tile(self, tile_id: u64, data: &[u8]) -> Self {
        self.run(tile_id, 1, data)
    }

    /// Adds a run of consecutive tiles sharing one payload.
    #[must_use]
    pub fn run(mut self, tile_id: u64, run_length: u32, data: &[u8]) -> Self {
        self.tiles.push((tile_id, run_length, data.to_vec()));
        self
    }

    /// Adds a pre-addressed directory entry verbatim, without
    /// allocating payload bytes for it. Useful for corrupt-archive
    /// tests.
    #[must_use]
    pub fn raw_entry(mut self, entry: Entry) -> Self {
        self.raw_entries.push(entry);
        self
    }

    /// Sets the metadata document.
    #[must_use]
    pub fn metadata(mut self, document: serde_json::Value) -> Self {
        self.metadata = document;
        self
    }

    /// Sets the internal compression for directories and metadata.
    #[must_use]
    pub fn internal_compression(mut self, compression: Compression) -> Self {
        self.internal_compression = compression;
        self
    }

    /// Sets the declared zoom range.
    #[must_use]
    pub fn zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    /// Sets the header's center zoom.
    #[must_use]
    pub fn center_zoom(mut self, center_zoom: u8) -> Self {
        self.center_zoom = center_zoom;
        self
    }

    /// Clears or sets the clustered flag.
    #[must_use]
    pub fn clustered(mut self, clustered: bool) -> Self {
        self.clustered = clustered;
        self
    }

    /// Sets the root directory byte budget, forcing leaf splits when
    /// small.
    #[must_use]
    pub fn root_budget(mut self, root_budget: usize) -> Self {
        self.root_budget = root_budget;
        self
    }

    /// Assembles the archive.
    ///
    /// # Errors
    ///
    /// Fails only if the configured internal compression cannot be
    /// produced.
    pub fn build(&self) -> FormatResult<Vec<u8>> {
        let mut sorted = self.tiles.clone();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut tile_data = Vec::new();
        let mut by_payload: HashMap<Vec<u8>, (u64, u32)> = HashMap::new();
        let mut entries = Vec::with_capacity(sorted.len() + self.raw_entries.len());
        let mut addressed_tiles = 0u64;

        for (tile_id, run_length, payload) in sorted {
            let (offset, length) = match by_payload.get(&payload) {
                Some(&span) => span,
                None => {
                    let span = (tile_data.len() as u64, payload.len() as u32);
                    tile_data.extend_from_slice(&payload);
                    by_payload.insert(payload, span);
                    span
                }
            };
            addressed_tiles += u64::from(run_length);
            entries.push(Entry {
                tile_id,
                run_length,
                offset,
                length,
            });
        }

        for entry in &self.raw_entries {
            addressed_tiles += u64::from(entry.run_length);
            entries.push(*entry);
        }
        entries.sort_by_key(|e| e.tile_id);

        let (root, leaves) =
            build_directories(&entries, self.root_budget, self.internal_compression)?;
        let metadata = encode_metadata(&self.metadata, self.internal_compression)?;

        let root_dir_offset = HEADER_LEN as u64;
        let metadata_offset = root_dir_offset + root.len() as u64;
        let leaf_dirs_offset = metadata_offset + metadata.len() as u64;
        let tile_data_offset = leaf_dirs_offset + leaves.len() as u64;

        let header = Header {
            root_dir_offset,
            root_dir_length: root.len() as u64,
            metadata_offset,
            metadata_length: metadata.len() as u64,
            leaf_dirs_offset,
            leaf_dirs_length: leaves.len() as u64,
            tile_data_offset,
            tile_data_length: tile_data.len() as u64,
            addressed_tiles,
            tile_entries: entries.len() as u64,
            tile_contents: by_payload.len() as u64,
            clustered: self.clustered,
            internal_compression: self.internal_compression,
            tile_compression: self.tile_compression,
            tile_type: self.tile_type,
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
            min_lon_e7: -1_800_000_000,
            min_lat_e7: -850_511_287,
            max_lon_e7: 1_800_000_000,
            max_lat_e7: 850_511_287,
            center_zoom: self.center_zoom,
            center_lon_e7: 0,
            center_lat_e7: 0,
        };

        let mut archive = header.encode().to_vec();
        archive.extend_from_slice(&root);
        archive.extend_from_slice(&metadata);
        archive.extend_from_slice(&leaves);
        archive.extend_from_slice(&tile_data);
        Ok(archive)
    }

    /// Assembles the archive into a memory backend.
    ///
    /// # Errors
    ///
    /// Same as [`ArchiveBuilder::build`].
    pub fn build_backend(&self) -> FormatResult<MemoryBackend> {
        Ok(MemoryBackend::from_bytes(self.build()?))
    }
}
