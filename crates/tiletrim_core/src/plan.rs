//! Deterministic compaction of distinct ranges and entry rewriting.

use crate::dedup::ByteRange;
use crate::error::{TrimError, TrimResult};
use std::collections::HashMap;
use tiletrim_format::Entry;

/// One distinct range scheduled for the output copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedRange {
    /// Offset in the source tile data region.
    pub source_offset: u64,
    /// Length in bytes.
    pub length: u32,
    /// Assigned offset in the output tile data region.
    pub output_offset: u64,
}

/// The address map assigning every distinct source range a packed
/// offset in the output tile data region.
///
/// Ranges are ordered by ascending source offset, then ascending
/// length; the secondary key makes pathological equal-offset inputs
/// deterministic. Output offsets are gapless: each range starts where
/// the previous one ends, and the running total is the output region
/// length. The mostly-ascending source order also keeps the final copy
/// close to sequential reads.
#[derive(Debug)]
pub struct CompactionPlan {
    ranges: Vec<PlannedRange>,
    by_source: HashMap<ByteRange, u64>,
    total_length: u64,
}

impl CompactionPlan {
    /// Builds the plan from the distinct ranges of one trim pass.
    #[must_use]
    pub fn build(mut ranges: Vec<ByteRange>) -> Self {
        ranges.sort_by_key(|r| (r.offset, r.length));

        let mut planned = Vec::with_capacity(ranges.len());
        let mut by_source = HashMap::with_capacity(ranges.len());
        let mut total = 0u64;
        for range in ranges {
            by_source.insert(range, total);
            planned.push(PlannedRange {
                source_offset: range.offset,
                length: range.length,
                output_offset: total,
            });
            total += u64::from(range.length);
        }

        Self {
            ranges: planned,
            by_source,
            total_length: total,
        }
    }

    /// Ranges in copy order.
    #[must_use]
    pub fn ranges(&self) -> &[PlannedRange] {
        &self.ranges
    }

    /// Total length of the output tile data region.
    #[must_use]
    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    /// Rewrites every entry's offset to its assigned output offset.
    ///
    /// # Errors
    ///
    /// Returns [`TrimError::RangeNotPlanned`] if an entry references a
    /// range the plan never saw; the planner and the rewriter are fed
    /// from the same collector, so this indicates a bug, not bad input.
    pub fn rewrite(&self, entries: &mut [Entry]) -> TrimResult<()> {
        for entry in entries.iter_mut() {
            let key = ByteRange::of(entry);
            let Some(&output) = self.by_source.get(&key) else {
                return Err(TrimError::RangeNotPlanned {
                    offset: entry.offset,
                    length: entry.length,
                });
            };
            entry.offset = output;
        }
        Ok(())
    }
}
