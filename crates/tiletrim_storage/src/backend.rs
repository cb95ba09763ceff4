//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level byte store holding one archive.
///
/// Backends are opaque: they serve ranged reads and sequential appends
/// and never interpret headers, directories, or tile payloads. A trim
/// operation reads its source archive through `read_at` and writes the
/// destination archive region by region through `append`.
///
/// # Invariants
///
/// - `append` returns the offset where the data landed, which equals
///   the store size before the call
/// - `read_at` returns exactly the bytes previously written there
/// - reads that extend past the current size fail rather than truncate
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range extends past the current size or
    /// the underlying read fails.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends data to the end of the store, returning its offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write fails, including when
    /// the backend was opened read-only.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Returns the current size of the store in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Forces all appended data down to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    fn sync(&mut self) -> StorageResult<()>;
}
