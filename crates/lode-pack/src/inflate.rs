//! Bounded zlib decompression for pack entries.
//!
//! Pack entry sizes are declared ahead of the compressed stream, so
//! decompression is always driven to an expected length and any deviation
//! is treated as corruption.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::{PackError, PackResult};

/// Decompress exactly `expected_len` bytes from the zlib stream at the
/// start of `input`.
///
/// Trailing bytes after the stream are ignored (pack entries are
/// concatenated back to back); the stream itself producing more or fewer
/// bytes than declared is an error.
pub fn inflate_exact(input: &[u8], expected_len: usize) -> PackResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(input);
    let mut out = vec![0u8; expected_len];
    decoder
        .read_exact(&mut out)
        .map_err(|e| PackError::DecompressionFailed(format!("short stream: {e}")))?;

    // The stream must end exactly where the declared size says it does.
    let mut probe = [0u8; 1];
    let extra = decoder
        .read(&mut probe)
        .map_err(|e| PackError::DecompressionFailed(e.to_string()))?;
    if extra != 0 {
        return Err(PackError::DecompressionFailed(format!(
            "stream longer than declared size {expected_len}"
        )));
    }

    Ok(out)
}

/// Decompress at most `max_len` bytes from the zlib stream at the start of
/// `input`, stopping early once the budget is filled.
///
/// Used to peek at entry headers without materializing the whole payload.
pub fn inflate_prefix(input: &[u8], max_len: usize) -> PackResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(input);
    let mut out = vec![0u8; max_len];
    let mut filled = 0;
    while filled < max_len {
        let n = decoder
            .read(&mut out[filled..])
            .map_err(|e| PackError::DecompressionFailed(e.to_string()))?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    out.truncate(filled);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn exact_roundtrip() {
        let data = b"some compressed payload".to_vec();
        let compressed = deflate(&data);
        assert_eq!(inflate_exact(&compressed, data.len()).unwrap(), data);
    }

    #[test]
    fn exact_rejects_short_declaration() {
        let compressed = deflate(b"0123456789");
        assert!(inflate_exact(&compressed, 5).is_err());
    }

    #[test]
    fn exact_rejects_long_declaration() {
        let compressed = deflate(b"0123456789");
        assert!(inflate_exact(&compressed, 20).is_err());
    }

    #[test]
    fn exact_ignores_trailing_bytes() {
        let data = b"payload".to_vec();
        let mut compressed = deflate(&data);
        compressed.extend_from_slice(b"next entry follows");
        assert_eq!(inflate_exact(&compressed, data.len()).unwrap(), data);
    }

    #[test]
    fn exact_zero_length() {
        let compressed = deflate(b"");
        assert_eq!(inflate_exact(&compressed, 0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn prefix_stops_at_budget() {
        let data = vec![0xabu8; 1000];
        let compressed = deflate(&data);
        let prefix = inflate_prefix(&compressed, 32).unwrap();
        assert_eq!(prefix, vec![0xabu8; 32]);
    }

    #[test]
    fn prefix_handles_short_streams() {
        let compressed = deflate(b"tiny");
        let prefix = inflate_prefix(&compressed, 32).unwrap();
        assert_eq!(prefix, b"tiny");
    }
}
