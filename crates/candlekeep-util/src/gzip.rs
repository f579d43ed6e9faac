//! Gzip decompression for compressed exchange payloads.

use flate2::read::GzDecoder;
use std::io::Read;
use thiserror::Error;

/// Leading bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Errors that can occur during decompression.
#[derive(Error, Debug)]
pub enum DecompressError {
    /// Gzip decoding failed.
    #[error("gzip decompression failed: {0}")]
    Gzip(#[from] std::io::Error),

    /// Empty input data.
    #[error("Empty input data")]
    EmptyInput,
}

/// Returns true if `data` starts with the gzip magic number.
#[must_use]
pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}

/// Decompresses gzip-compressed data.
///
/// # Errors
///
/// Returns an error if the input is empty or not valid gzip.
pub fn gzip_uncompress(compressed: &[u8]) -> Result<Vec<u8>, DecompressError> {
    if compressed.is_empty() {
        return Err(DecompressError::EmptyInput);
    }

    let mut decompressed = Vec::new();
    GzDecoder::new(compressed).read_to_end(&mut decompressed)?;

    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    #[test]
    fn test_decompress_payload() {
        let payload = br#"{"ch":"market.btcusdt.kline.1min","tick":{"id":1}}"#;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(payload).unwrap();
        let compressed = encoder.finish().unwrap();

        assert!(is_gzip(&compressed));
        assert_eq!(gzip_uncompress(&compressed).unwrap(), payload.to_vec());
    }

    #[test]
    fn test_empty_input() {
        let result = gzip_uncompress(&[]);
        assert!(matches!(result, Err(DecompressError::EmptyInput)));
    }

    #[test]
    fn test_invalid_gzip() {
        let result = gzip_uncompress(&[0x00, 0x01, 0x02, 0x03]);
        assert!(matches!(result, Err(DecompressError::Gzip(_))));
        assert!(!is_gzip(b"[]"));
    }
}
