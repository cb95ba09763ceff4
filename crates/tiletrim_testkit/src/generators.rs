//! Property-test generators for directory entries.

use proptest::prelude::*;
use tiletrim_format::Entry;

/// Strategy producing one tile entry with a bounded address space.
pub fn entry() -> impl Strategy<Value = Entry> {
    (0u64..1 << 24, 1u32..32, 0u64..1 << 20, 1u32..4096).prop_map(
        |(tile_id, run_length, offset, length)| Entry {
            tile_id,
            run_length,
            offset,
            length,
        },
    )
}

/// Strategy producing a directory: entries sorted by tile identifier,
/// identifiers unique, up to `max_len` of them.
pub fn directory(max_len: usize) -> impl Strategy<Value = Vec<Entry>> {
    proptest::collection::vec(entry(), 0..=max_len).prop_map(|mut entries| {
        entries.sort_by_key(|e| e.tile_id);
        entries.dedup_by_key(|e| e.tile_id);
        entries
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn directories_are_sorted_and_unique(entries in directory(64)) {
            prop_assert!(entries.windows(2).all(|w| w[0].tile_id < w[1].tile_id));
            prop_assert!(entries.iter().all(|e| e.run_length >= 1 && e.length >= 1));
        }
    }
}
