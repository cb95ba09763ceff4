//! Entry validation and clamping against the zoom cutoff.

use crate::error::{TrimError, TrimResult};
use tiletrim_format::Entry;

/// Validates decoded entries against the zoom cutoff and resolves the
/// relative-vs-absolute offset ambiguity.
///
/// Producers disagree on whether entry offsets are relative to the tile
/// data region or absolute file offsets. The normalizer accepts the
/// relative interpretation whenever `offset + length` fits inside the
/// region; failing that, an offset landing inside the region's file
/// span is converted to relative. An offset valid under neither
/// interpretation is an input-integrity error and aborts the whole
/// operation.
#[derive(Debug, Clone, Copy)]
pub struct EntryNormalizer {
    cutoff: u64,
    tile_data_offset: u64,
    tile_data_length: u64,
}

impl EntryNormalizer {
    /// Creates a normalizer for one trim pass.
    ///
    /// `cutoff` is the exclusive upper bound on retained tile
    /// identifiers; the region arguments are the source archive's tile
    /// data bounds.
    #[must_use]
    pub fn new(cutoff: u64, tile_data_offset: u64, tile_data_length: u64) -> Self {
        Self {
            cutoff,
            tile_data_offset,
            tile_data_length,
        }
    }

    /// Normalizes one decoded entry.
    ///
    /// Returns `Ok(None)` for entries that fall away entirely: those
    /// starting at or beyond the cutoff, and those with an empty byte
    /// range ("no tile present"). A run straddling the cutoff is
    /// clamped to end just before it. A run length of 0 is read as 1,
    /// for producers that omit the count on single-tile entries.
    ///
    /// Emission order is the caller's concern; the normalizer never
    /// merges or reorders entries.
    ///
    /// # Errors
    ///
    /// Returns [`TrimError::RangeOutOfBounds`] when the entry's byte
    /// range fits neither offset interpretation.
    pub fn normalize(&self, entry: &Entry) -> TrimResult<Option<Entry>> {
        if entry.tile_id >= self.cutoff || entry.length == 0 {
            return Ok(None);
        }

        let run_length = u64::from(entry.run_length).max(1);
        // tile_id < cutoff, so the clamp always leaves at least one tile.
        let run_length = run_length.min(self.cutoff - entry.tile_id) as u32;

        let offset = self.resolve_offset(entry)?;
        Ok(Some(Entry {
            tile_id: entry.tile_id,
            run_length,
            offset,
            length: entry.length,
        }))
    }

    fn resolve_offset(&self, entry: &Entry) -> TrimResult<u64> {
        let length = u64::from(entry.length);
        // Relative interpretation wins whenever the range fits the region.
        if length <= self.tile_data_length && entry.offset <= self.tile_data_length - length {
            return Ok(entry.offset);
        }
        // Otherwise accept an absolute file offset landing inside the region.
        let region_end = self.tile_data_offset.saturating_add(self.tile_data_length);
        if entry.offset >= self.tile_data_offset
            && entry
                .offset
                .checked_add(length)
                .is_some_and(|end| end <= region_end)
        {
            return Ok(entry.offset - self.tile_data_offset);
        }
        Err(TrimError::RangeOutOfBounds {
            tile_id: entry.tile_id,
            offset: entry.offset,
            length: entry.length,
        })
    }
}
