//! Internal-compression helpers for directories and metadata.

use crate::error::{FormatError, FormatResult};
use crate::header::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};

/// Compresses a block with the archive's internal compression.
///
/// # Errors
///
/// Returns [`FormatError::UnsupportedCompression`] for codecs this build
/// cannot produce (brotli, zstd, or an undeclared codec).
pub fn compress(data: &[u8], compression: Compression) -> FormatResult<Vec<u8>> {
    match compression {
        Compression::None => Ok(data.to_vec()),
        Compression::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
        other => Err(FormatError::UnsupportedCompression(other.as_byte())),
    }
}

/// Decompresses a block encoded with the archive's internal compression.
///
/// # Errors
///
/// Returns [`FormatError::UnsupportedCompression`] for codecs this build
/// cannot process, or an I/O error for corrupt gzip streams.
pub fn decompress(data: &[u8], compression: Compression) -> FormatResult<Vec<u8>> {
    match compression {
        Compression::None => Ok(data.to_vec()),
        Compression::Gzip => {
            let mut out = Vec::with_capacity(data.len().saturating_mul(4));
            GzDecoder::new(data).read_to_end(&mut out)?;
            Ok(out)
        }
        other => Err(FormatError::UnsupportedCompression(other.as_byte())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_roundtrip() {
        let data = b"a block of directory bytes, repeated repeated repeated";
        let packed = compress(data, Compression::Gzip).unwrap();
        assert_ne!(packed, data);
        let unpacked = decompress(&packed, Compression::Gzip).unwrap();
        assert_eq!(unpacked, data);
    }

    #[test]
    fn none_is_identity() {
        let data = b"raw".to_vec();
        assert_eq!(compress(&data, Compression::None).unwrap(), data);
        assert_eq!(decompress(&data, Compression::None).unwrap(), data);
    }

    #[test]
    fn unsupported_codecs_fail() {
        for codec in [Compression::Brotli, Compression::Zstd, Compression::Unknown] {
            assert!(matches!(
                compress(b"x", codec),
                Err(FormatError::UnsupportedCompression(_))
            ));
            assert!(matches!(
                decompress(b"x", codec),
                Err(FormatError::UnsupportedCompression(_))
            ));
        }
    }

    #[test]
    fn corrupt_gzip_fails() {
        let result = decompress(&[0x1f, 0x8b, 0xff, 0x00], Compression::Gzip);
        assert!(matches!(result, Err(FormatError::Io(_))));
    }
}
