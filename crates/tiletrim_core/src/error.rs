//! Error types for the trim engine.

use std::io;
use thiserror::Error;

/// Result type for trim operations.
pub type TrimResult<T> = Result<T, TrimError>;

/// Errors that can occur while trimming an archive.
///
/// Every variant is fatal: the operation aborts at the point of
/// detection and no partial destination archive is considered valid.
#[derive(Debug, Error)]
pub enum TrimError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] tiletrim_storage::StorageError),

    /// Container codec error.
    #[error("format error: {0}")]
    Format(#[from] tiletrim_format::FormatError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source archive is not clustered, so it cannot be streamed
    /// in a single pass.
    #[error("source archive is not clustered")]
    NotClustered,

    /// The requested maximum zoom cannot be addressed.
    #[error("maximum zoom {requested} is out of range 0..=31")]
    ZoomOutOfRange {
        /// The zoom level that was requested.
        requested: u8,
    },

    /// An entry's byte range cannot be reconciled with the tile data
    /// region under either offset interpretation.
    #[error(
        "entry for tile {tile_id} addresses bytes outside the tile data region \
         (offset {offset}, length {length})"
    )]
    RangeOutOfBounds {
        /// First tile identifier of the offending entry.
        tile_id: u64,
        /// The entry's offset as stored.
        offset: u64,
        /// The entry's byte length.
        length: u32,
    },

    /// A retained entry references a range the compaction plan never
    /// saw. The planner and the rewriter are fed from the same range
    /// set, so this is unreachable short of a bug.
    #[error("compaction plan is missing range (offset {offset}, length {length}); this is a bug")]
    RangeNotPlanned {
        /// Source offset of the missing range.
        offset: u64,
        /// Length of the missing range.
        length: u32,
    },
}
