//! Distinct-range collection over the normalized entry stream.

use std::collections::HashSet;
use tiletrim_format::Entry;

/// A physical byte span in the source tile data region.
///
/// Two ranges are equal iff both fields match exactly; many entries may
/// reference one range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    /// Offset relative to the tile data region.
    pub offset: u64,
    /// Length in bytes.
    pub length: u32,
}

impl ByteRange {
    /// The range an entry's bytes occupy.
    #[must_use]
    pub fn of(entry: &Entry) -> Self {
        Self {
            offset: entry.offset,
            length: entry.length,
        }
    }
}

/// Accumulates retained entries and the distinct byte ranges they
/// reference, preserving both arrival order and first-seen range order.
#[derive(Debug, Default)]
pub struct RangeCollector {
    seen: HashSet<ByteRange>,
    ranges: Vec<ByteRange>,
    entries: Vec<Entry>,
    addressed_tiles: u64,
}

impl RangeCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits one normalized entry, recording its range on first sight.
    pub fn admit(&mut self, entry: Entry) {
        let range = ByteRange::of(&entry);
        if self.seen.insert(range) {
            self.ranges.push(range);
        }
        self.addressed_tiles += u64::from(entry.run_length);
        self.entries.push(entry);
    }

    /// Number of entries admitted so far.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Consumes the collector, yielding the retained entries in arrival
    /// order, the distinct ranges in first-seen order, and the total
    /// addressed-tile count.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Entry>, Vec<ByteRange>, u64) {
        (self.entries, self.ranges, self.addressed_tiles)
    }
}
