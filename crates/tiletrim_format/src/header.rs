//! Fixed-size archive header.

use crate::error::{FormatError, FormatResult};

/// Size of the fixed archive header in bytes.
pub const HEADER_LEN: usize = 127;

/// Magic bytes at the start of every archive.
pub const MAGIC: &[u8; 7] = b"PMTiles";

/// The only archive version this codec speaks.
pub const VERSION: u8 = 3;

/// Compression applied to directories, metadata, or tile payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// The archive did not declare a compression codec.
    Unknown,
    /// Uncompressed.
    None,
    /// Gzip.
    Gzip,
    /// Brotli (recognized but not processed by this build).
    Brotli,
    /// Zstandard (recognized but not processed by this build).
    Zstd,
}

impl Compression {
    /// Decodes a compression code byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            1 => Self::None,
            2 => Self::Gzip,
            3 => Self::Brotli,
            4 => Self::Zstd,
            _ => Self::Unknown,
        }
    }

    /// Returns the on-disk code byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::None => 1,
            Self::Gzip => 2,
            Self::Brotli => 3,
            Self::Zstd => 4,
        }
    }
}

/// Payload kind stored in the tile-data region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileType {
    /// The archive did not declare a tile type.
    Unknown,
    /// Mapbox vector tiles.
    Mvt,
    /// PNG raster tiles.
    Png,
    /// JPEG raster tiles.
    Jpeg,
    /// WebP raster tiles.
    Webp,
    /// AVIF raster tiles.
    Avif,
}

impl TileType {
    /// Decodes a tile-type code byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            1 => Self::Mvt,
            2 => Self::Png,
            3 => Self::Jpeg,
            4 => Self::Webp,
            5 => Self::Avif,
            _ => Self::Unknown,
        }
    }

    /// Returns the on-disk code byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Mvt => 1,
            Self::Png => 2,
            Self::Jpeg => 3,
            Self::Webp => 4,
            Self::Avif => 5,
        }
    }
}

/// The decoded 127-byte archive header.
///
/// All multi-byte fields are little-endian on disk. The four content
/// regions (root directory, metadata, leaf directories, tile data) are
/// addressed by absolute file offset; directory entries address tile
/// bytes relative to `tile_data_offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// File offset of the root directory block.
    pub root_dir_offset: u64,
    /// Byte length of the root directory block.
    pub root_dir_length: u64,
    /// File offset of the metadata block.
    pub metadata_offset: u64,
    /// Byte length of the metadata block.
    pub metadata_length: u64,
    /// File offset of the leaf directories section.
    pub leaf_dirs_offset: u64,
    /// Byte length of the leaf directories section.
    pub leaf_dirs_length: u64,
    /// File offset of the tile data region.
    pub tile_data_offset: u64,
    /// Byte length of the tile data region.
    pub tile_data_length: u64,
    /// Number of tiles addressed by directory entries (runs expanded).
    pub addressed_tiles: u64,
    /// Number of directory entries pointing at tile data.
    pub tile_entries: u64,
    /// Number of distinct tile byte spans.
    pub tile_contents: u64,
    /// Whether tile data offsets are ordered by tile identifier.
    pub clustered: bool,
    /// Compression of directories and metadata.
    pub internal_compression: Compression,
    /// Compression of tile payloads.
    pub tile_compression: Compression,
    /// Payload kind of the tile data.
    pub tile_type: TileType,
    /// Lowest zoom level present.
    pub min_zoom: u8,
    /// Highest zoom level present.
    pub max_zoom: u8,
    /// Western bound, degrees scaled by 1e7.
    pub min_lon_e7: i32,
    /// Southern bound, degrees scaled by 1e7.
    pub min_lat_e7: i32,
    /// Eastern bound, degrees scaled by 1e7.
    pub max_lon_e7: i32,
    /// Northern bound, degrees scaled by 1e7.
    pub max_lat_e7: i32,
    /// Suggested default zoom for viewers.
    pub center_zoom: u8,
    /// Suggested default longitude, degrees scaled by 1e7.
    pub center_lon_e7: i32,
    /// Suggested default latitude, degrees scaled by 1e7.
    pub center_lat_e7: i32,
}

impl Header {
    /// Decodes a header from the first [`HEADER_LEN`] bytes of an archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is too short, the magic bytes are
    /// wrong, or the version is not 3.
    pub fn decode(data: &[u8]) -> FormatResult<Self> {
        if data.len() < HEADER_LEN {
            return Err(FormatError::Truncated("header"));
        }
        if &data[0..7] != MAGIC {
            return Err(FormatError::BadMagic);
        }
        if data[7] != VERSION {
            return Err(FormatError::UnsupportedVersion(data[7]));
        }

        Ok(Self {
            root_dir_offset: u64_at(data, 8),
            root_dir_length: u64_at(data, 16),
            metadata_offset: u64_at(data, 24),
            metadata_length: u64_at(data, 32),
            leaf_dirs_offset: u64_at(data, 40),
            leaf_dirs_length: u64_at(data, 48),
            tile_data_offset: u64_at(data, 56),
            tile_data_length: u64_at(data, 64),
            addressed_tiles: u64_at(data, 72),
            tile_entries: u64_at(data, 80),
            tile_contents: u64_at(data, 88),
            clustered: data[96] == 1,
            internal_compression: Compression::from_byte(data[97]),
            tile_compression: Compression::from_byte(data[98]),
            tile_type: TileType::from_byte(data[99]),
            min_zoom: data[100],
            max_zoom: data[101],
            min_lon_e7: i32_at(data, 102),
            min_lat_e7: i32_at(data, 106),
            max_lon_e7: i32_at(data, 110),
            max_lat_e7: i32_at(data, 114),
            center_zoom: data[118],
            center_lon_e7: i32_at(data, 119),
            center_lat_e7: i32_at(data, 123),
        })
    }

    /// Serializes the header to its fixed on-disk form.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..7].copy_from_slice(MAGIC);
        buf[7] = VERSION;
        put_u64(&mut buf, 8, self.root_dir_offset);
        put_u64(&mut buf, 16, self.root_dir_length);
        put_u64(&mut buf, 24, self.metadata_offset);
        put_u64(&mut buf, 32, self.metadata_length);
        put_u64(&mut buf, 40, self.leaf_dirs_offset);
        put_u64(&mut buf, 48, self.leaf_dirs_length);
        put_u64(&mut buf, 56, self.tile_data_offset);
        put_u64(&mut buf, 64, self.tile_data_length);
        put_u64(&mut buf, 72, self.addressed_tiles);
        put_u64(&mut buf, 80, self.tile_entries);
        put_u64(&mut buf, 88, self.tile_contents);
        buf[96] = u8::from(self.clustered);
        buf[97] = self.internal_compression.as_byte();
        buf[98] = self.tile_compression.as_byte();
        buf[99] = self.tile_type.as_byte();
        buf[100] = self.min_zoom;
        buf[101] = self.max_zoom;
        put_i32(&mut buf, 102, self.min_lon_e7);
        put_i32(&mut buf, 106, self.min_lat_e7);
        put_i32(&mut buf, 110, self.max_lon_e7);
        put_i32(&mut buf, 114, self.max_lat_e7);
        buf[118] = self.center_zoom;
        put_i32(&mut buf, 119, self.center_lon_e7);
        put_i32(&mut buf, 123, self.center_lat_e7);
        buf
    }
}

fn u64_at(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(bytes)
}

fn i32_at(buf: &[u8], at: usize) -> i32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[at..at + 4]);
    i32::from_le_bytes(bytes)
}

fn put_u64(buf: &mut [u8], at: usize, value: u64) {
    buf[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

fn put_i32(buf: &mut [u8], at: usize, value: i32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}
