//! Directory entry (de)serialization and directory-tree building.
//!
//! A serialized directory holds its entry count followed by four
//! columns: delta-encoded tile identifiers, run lengths, byte lengths,
//! and offsets. An offset varint of `0` means "directly after the
//! previous entry's bytes"; any other value `v` stores offset `v - 1`.

use crate::compression::compress;
use crate::error::{FormatError, FormatResult};
use crate::header::Compression;
use crate::varint::{read_varint, write_varint};

/// One directory entry.
///
/// An entry with `run_length > 0` maps `run_length` consecutive tile
/// identifiers starting at `tile_id` to one span of `length` bytes at
/// `offset` in the tile data region. An entry with `run_length == 0`
/// points at a leaf directory instead: `offset` and `length` then
/// address the serialized leaf within the leaf directories section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// First tile identifier covered by this entry.
    pub tile_id: u64,
    /// Number of consecutive tile identifiers sharing the byte span,
    /// or 0 for a leaf-directory pointer.
    pub run_length: u32,
    /// Byte offset of the span, relative to the region it lives in.
    pub offset: u64,
    /// Byte length of the span.
    pub length: u32,
}

/// Upper bound on entries in one directory block, guarding allocation
/// against corrupt counts.
const MAX_DIR_ENTRIES: u64 = 16 * 1024 * 1024;

/// Number of entries per leaf on the first split attempt.
const INITIAL_LEAF_SIZE: usize = 4096;

/// Default byte budget for the compressed root directory block.
pub const DEFAULT_ROOT_BUDGET: usize = 16_384;

/// Decodes a serialized (already decompressed) directory block.
///
/// # Errors
///
/// Returns an error on truncated varints, out-of-range column values,
/// or an offset delta with no predecessor.
pub fn deserialize_directory(data: &[u8]) -> FormatResult<Vec<Entry>> {
    let mut pos = 0;
    let count = read_varint(data, &mut pos)?;
    if count == 0 {
        return Ok(Vec::new());
    }
    if count > MAX_DIR_ENTRIES {
        return Err(FormatError::malformed_directory(format!(
            "entry count {count} exceeds limit"
        )));
    }
    let count = count as usize;

    let mut entries = vec![
        Entry {
            tile_id: 0,
            run_length: 0,
            offset: 0,
            length: 0,
        };
        count
    ];

    let mut last_id = 0u64;
    for entry in &mut entries {
        let delta = read_varint(data, &mut pos)?;
        last_id = last_id
            .checked_add(delta)
            .ok_or_else(|| FormatError::malformed_directory("tile identifier overflows u64"))?;
        entry.tile_id = last_id;
    }

    for entry in &mut entries {
        entry.run_length = narrow(read_varint(data, &mut pos)?, "run length")?;
    }

    for entry in &mut entries {
        entry.length = narrow(read_varint(data, &mut pos)?, "length")?;
    }

    for i in 0..count {
        let value = read_varint(data, &mut pos)?;
        entries[i].offset = if value == 0 {
            if i == 0 {
                return Err(FormatError::malformed_directory(
                    "offset delta with no predecessor",
                ));
            }
            entries[i - 1]
                .offset
                .checked_add(u64::from(entries[i - 1].length))
                .ok_or_else(|| FormatError::malformed_directory("offset overflows u64"))?
        } else {
            value - 1
        };
    }

    Ok(entries)
}

/// Encodes a directory block. Entries must be sorted by tile identifier.
#[must_use]
pub fn serialize_directory(entries: &[Entry]) -> Vec<u8> {
    debug_assert!(entries.windows(2).all(|w| w[0].tile_id <= w[1].tile_id));

    let mut out = Vec::with_capacity(entries.len() * 5 + 2);
    write_varint(&mut out, entries.len() as u64);

    let mut last_id = 0u64;
    for entry in entries {
        write_varint(&mut out, entry.tile_id - last_id);
        last_id = entry.tile_id;
    }
    for entry in entries {
        write_varint(&mut out, u64::from(entry.run_length));
    }
    for entry in entries {
        write_varint(&mut out, u64::from(entry.length));
    }
    for (i, entry) in entries.iter().enumerate() {
        let contiguous = i > 0
            && entry.offset == entries[i - 1].offset + u64::from(entries[i - 1].length);
        if contiguous {
            write_varint(&mut out, 0);
        } else {
            write_varint(&mut out, entry.offset + 1);
        }
    }
    out
}

/// Builds the root directory block and, if the entries do not fit the
/// root budget, a leaf directories section.
///
/// All entries are first serialized into a single root; when its
/// compressed size exceeds `root_budget` they are split into leaves of
/// a fixed entry count (doubling from 4096 until the root of leaf
/// pointers fits). Leaf pointers carry `run_length == 0` and address
/// their leaf relative to the start of the returned leaf section.
///
/// # Errors
///
/// Returns an error if the internal compression cannot be produced.
pub fn build_directories(
    entries: &[Entry],
    root_budget: usize,
    compression: Compression,
) -> FormatResult<(Vec<u8>, Vec<u8>)> {
    let root = compress(&serialize_directory(entries), compression)?;
    if root.len() <= root_budget {
        return Ok((root, Vec::new()));
    }

    let mut leaf_size = INITIAL_LEAF_SIZE;
    loop {
        let (root, leaves) = build_with_leaves(entries, leaf_size, compression)?;
        if root.len() <= root_budget || leaf_size >= entries.len() {
            return Ok((root, leaves));
        }
        leaf_size *= 2;
    }
}

fn build_with_leaves(
    entries: &[Entry],
    leaf_size: usize,
    compression: Compression,
) -> FormatResult<(Vec<u8>, Vec<u8>)> {
    let mut root_entries = Vec::with_capacity(entries.len().div_ceil(leaf_size));
    let mut leaves = Vec::new();
    for chunk in entries.chunks(leaf_size) {
        let leaf = compress(&serialize_directory(chunk), compression)?;
        root_entries.push(Entry {
            tile_id: chunk[0].tile_id,
            run_length: 0,
            offset: leaves.len() as u64,
            length: leaf.len() as u32,
        });
        leaves.extend_from_slice(&leaf);
    }
    let root = compress(&serialize_directory(&root_entries), compression)?;
    Ok((root, leaves))
}

fn narrow(value: u64, what: &str) -> FormatResult<u32> {
    u32::try_from(value)
        .map_err(|_| FormatError::malformed_directory(format!("{what} {value} overflows u32")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::decompress;
    use proptest::prelude::*;

    fn entry(tile_id: u64, run_length: u32, offset: u64, length: u32) -> Entry {
        Entry {
            tile_id,
            run_length,
            offset,
            length,
        }
    }

    #[test]
    fn empty_directory() {
        let bytes = serialize_directory(&[]);
        assert_eq!(bytes, [0]);
        assert!(deserialize_directory(&bytes).unwrap().is_empty());
    }

    #[test]
    fn roundtrip_preserves_entries() {
        let entries = vec![
            entry(0, 1, 0, 100),
            entry(1, 3, 100, 50),
            entry(4, 1, 150, 25),
            // Shared span, breaks the contiguous-offset chain.
            entry(5, 1, 0, 100),
        ];
        let bytes = serialize_directory(&entries);
        assert_eq!(deserialize_directory(&bytes).unwrap(), entries);
    }

    #[test]
    fn contiguous_offsets_encode_as_zero() {
        let entries = vec![entry(0, 1, 0, 10), entry(1, 1, 10, 20)];
        let bytes = serialize_directory(&entries);
        // count, two deltas, two run lengths, two lengths, offset 1, offset 0.
        assert_eq!(bytes, [2, 0, 1, 1, 1, 10, 20, 1, 0]);
    }

    #[test]
    fn leading_offset_delta_is_rejected() {
        // count 1, delta 0, run 1, length 10, offset varint 0.
        let bytes = [1, 0, 1, 10, 0];
        assert!(matches!(
            deserialize_directory(&bytes),
            Err(FormatError::MalformedDirectory { .. })
        ));
    }

    #[test]
    fn truncated_directory_is_rejected() {
        let entries = vec![entry(0, 1, 0, 10), entry(1, 1, 10, 20)];
        let bytes = serialize_directory(&entries);
        assert!(deserialize_directory(&bytes[..bytes.len() - 2]).is_err());
    }

    #[test]
    fn oversized_run_length_is_rejected() {
        let mut bytes = Vec::new();
        crate::varint::write_varint(&mut bytes, 1); // count
        crate::varint::write_varint(&mut bytes, 7); // tile id
        crate::varint::write_varint(&mut bytes, u64::from(u32::MAX) + 1); // run length
        crate::varint::write_varint(&mut bytes, 1); // length
        crate::varint::write_varint(&mut bytes, 1); // offset
        assert!(matches!(
            deserialize_directory(&bytes),
            Err(FormatError::MalformedDirectory { .. })
        ));
    }

    #[test]
    fn small_directory_fits_the_root() {
        let entries = vec![entry(0, 1, 0, 10), entry(1, 1, 10, 20)];
        let (root, leaves) = build_directories(&entries, DEFAULT_ROOT_BUDGET, Compression::None)
            .unwrap();
        assert!(leaves.is_empty());
        assert_eq!(deserialize_directory(&root).unwrap(), entries);
    }

    #[test]
    fn oversized_directory_splits_into_leaves() {
        // Non-contiguous offsets so every entry costs several bytes.
        let entries: Vec<Entry> = (0..10_000)
            .map(|i| entry(i * 3, 1, i * 1000, 999))
            .collect();
        let budget = 512;
        let (root, leaves) =
            build_directories(&entries, budget, Compression::None).unwrap();
        assert!(root.len() <= budget);
        assert!(!leaves.is_empty());

        let root_entries = deserialize_directory(&root).unwrap();
        assert!(root_entries.iter().all(|e| e.run_length == 0));

        // Reassemble every leaf and compare against the input.
        let mut collected = Vec::new();
        for pointer in &root_entries {
            let start = pointer.offset as usize;
            let end = start + pointer.length as usize;
            let leaf = decompress(&leaves[start..end], Compression::None).unwrap();
            collected.extend(deserialize_directory(&leaf).unwrap());
        }
        assert_eq!(collected, entries);
    }

    #[test]
    fn leaf_pointers_carry_first_tile_ids() {
        let entries: Vec<Entry> = (0..9000).map(|i| entry(i, 1, i * 10, 9)).collect();
        let (root, _leaves) = build_directories(&entries, 64, Compression::None).unwrap();
        let root_entries = deserialize_directory(&root).unwrap();
        assert_eq!(root_entries[0].tile_id, 0);
        assert!(root_entries.windows(2).all(|w| w[0].tile_id < w[1].tile_id));
    }

    proptest! {
        #[test]
        fn roundtrip_sorted_entries(
            raw in proptest::collection::vec((0u64..1 << 40, 1u32..64, 0u64..1 << 30, 1u32..1 << 20), 0..64)
        ) {
            let mut entries: Vec<Entry> = raw
                .into_iter()
                .map(|(tile_id, run_length, offset, length)| entry(tile_id, run_length, offset, length))
                .collect();
            entries.sort_by_key(|e| e.tile_id);
            entries.dedup_by_key(|e| e.tile_id);
            let bytes = serialize_directory(&entries);
            prop_assert_eq!(deserialize_directory(&bytes).unwrap(), entries);
        }
    }
}
