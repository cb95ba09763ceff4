//! Ordered traversal of an archive's directory tree.

use crate::compression::decompress;
use crate::directory::{deserialize_directory, Entry};
use crate::error::FormatError;
use crate::header::Header;

/// Maximum accepted leaf-directory nesting depth below the root.
const MAX_DEPTH: usize = 4;

/// Walks every tile entry of an archive in storage order, which is
/// ascending tile-identifier order for clustered archives.
///
/// `fetch` reads `len` bytes at an absolute file offset. `visit` is
/// called once per tile entry; leaf-directory pointers are followed,
/// not visited. Both callbacks may fail with the caller's error type,
/// which must absorb [`FormatError`] for the codec's own failures.
///
/// # Errors
///
/// Fails on fetch or visit errors, undecodable directory blocks, or
/// leaf pointers nested deeper than the format allows.
pub fn each_entry<F, V, E>(header: &Header, fetch: &mut F, visit: &mut V) -> Result<(), E>
where
    F: FnMut(u64, usize) -> Result<Vec<u8>, E>,
    V: FnMut(&Entry) -> Result<(), E>,
    E: From<FormatError>,
{
    let raw = fetch(header.root_dir_offset, header.root_dir_length as usize)?;
    let root = decompress(&raw, header.internal_compression)?;
    let entries = deserialize_directory(&root)?;
    walk(header, &entries, fetch, visit, 0)
}

fn walk<F, V, E>(
    header: &Header,
    entries: &[Entry],
    fetch: &mut F,
    visit: &mut V,
    depth: usize,
) -> Result<(), E>
where
    F: FnMut(u64, usize) -> Result<Vec<u8>, E>,
    V: FnMut(&Entry) -> Result<(), E>,
    E: From<FormatError>,
{
    for entry in entries {
        if entry.run_length > 0 {
            visit(entry)?;
            continue;
        }
        if depth >= MAX_DEPTH {
            return Err(FormatError::malformed_directory("leaf directories nested too deep").into());
        }
        let raw = fetch(header.leaf_dirs_offset + entry.offset, entry.length as usize)?;
        let leaf = decompress(&raw, header.internal_compression)?;
        let leaf_entries = deserialize_directory(&leaf)?;
        walk(header, &leaf_entries, fetch, visit, depth + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{build_directories, serialize_directory};
    use crate::error::FormatResult;
    use crate::header::{Compression, TileType, HEADER_LEN};

    fn entry(tile_id: u64, run_length: u32, offset: u64, length: u32) -> Entry {
        Entry {
            tile_id,
            run_length,
            offset,
            length,
        }
    }

    /// Assembles header + root + leaves into one buffer and walks it.
    fn walk_archive(entries: &[Entry], root_budget: usize) -> Vec<Entry> {
        let (root, leaves) =
            build_directories(entries, root_budget, Compression::Gzip).unwrap();
        let header = Header {
            root_dir_offset: HEADER_LEN as u64,
            root_dir_length: root.len() as u64,
            metadata_offset: HEADER_LEN as u64 + root.len() as u64,
            metadata_length: 0,
            leaf_dirs_offset: HEADER_LEN as u64 + root.len() as u64,
            leaf_dirs_length: leaves.len() as u64,
            tile_data_offset: HEADER_LEN as u64 + root.len() as u64 + leaves.len() as u64,
            tile_data_length: 0,
            addressed_tiles: 0,
            tile_entries: entries.len() as u64,
            tile_contents: 0,
            clustered: true,
            internal_compression: Compression::Gzip,
            tile_compression: Compression::None,
            tile_type: TileType::Png,
            min_zoom: 0,
            max_zoom: 3,
            min_lon_e7: 0,
            min_lat_e7: 0,
            max_lon_e7: 0,
            max_lat_e7: 0,
            center_zoom: 0,
            center_lon_e7: 0,
            center_lat_e7: 0,
        };
        let mut file = header.encode().to_vec();
        file.extend_from_slice(&root);
        file.extend_from_slice(&leaves);

        let mut fetch = |offset: u64, len: usize| -> FormatResult<Vec<u8>> {
            let start = offset as usize;
            Ok(file[start..start + len].to_vec())
        };
        let mut visited = Vec::new();
        let mut visit = |e: &Entry| -> FormatResult<()> {
            visited.push(*e);
            Ok(())
        };
        each_entry(&header, &mut fetch, &mut visit).unwrap();
        visited
    }

    #[test]
    fn visits_root_entries_in_order() {
        let entries = vec![entry(0, 1, 0, 4), entry(1, 2, 4, 4), entry(9, 1, 8, 4)];
        assert_eq!(walk_archive(&entries, 16_384), entries);
    }

    #[test]
    fn follows_leaf_pointers_transparently() {
        let entries: Vec<Entry> = (0..9000u64).map(|i| entry(i, 1, i * 8, 8)).collect();
        // A budget below gzip's fixed overhead forces a leaf split; the
        // walk must still yield every tile entry in order.
        assert_eq!(walk_archive(&entries, 16), entries);
    }

    #[test]
    fn visit_errors_stop_the_walk() {
        let entries = vec![entry(0, 1, 0, 4), entry(1, 1, 4, 4)];
        let bytes = serialize_directory(&entries);
        let header = Header {
            root_dir_offset: 0,
            root_dir_length: bytes.len() as u64,
            metadata_offset: 0,
            metadata_length: 0,
            leaf_dirs_offset: 0,
            leaf_dirs_length: 0,
            tile_data_offset: 0,
            tile_data_length: 0,
            addressed_tiles: 0,
            tile_entries: 0,
            tile_contents: 0,
            clustered: true,
            internal_compression: Compression::None,
            tile_compression: Compression::None,
            tile_type: TileType::Png,
            min_zoom: 0,
            max_zoom: 1,
            min_lon_e7: 0,
            min_lat_e7: 0,
            max_lon_e7: 0,
            max_lat_e7: 0,
            center_zoom: 0,
            center_lon_e7: 0,
            center_lat_e7: 0,
        };
        let mut fetch = |offset: u64, len: usize| -> FormatResult<Vec<u8>> {
            let start = offset as usize;
            Ok(bytes[start..start + len].to_vec())
        };
        let mut count = 0;
        let result = each_entry(&header, &mut fetch, &mut |_e: &Entry| {
            count += 1;
            Err(FormatError::Truncated("synthetic"))
        });
        assert!(result.is_err());
        assert_eq!(count, 1);
    }
}
