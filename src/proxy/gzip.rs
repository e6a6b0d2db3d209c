//! Gzip decompression of upstream bodies.

use std::io::Read;

use flate2::read::MultiGzDecoder;

use crate::proxy::error::TranslateError;

const READ_CHUNK: usize = 4096;

/// Decompress a complete gzip stream, concatenating every member.
///
/// Output is read incrementally into a growable buffer, so the decompressed
/// size is unbounded by the input size.
pub fn gunzip(gzipped: &[u8]) -> Result<Vec<u8>, TranslateError> {
    let mut decoder = MultiGzDecoder::new(gzipped);
    let mut out = Vec::with_capacity(gzipped.len());
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = decoder.read(&mut chunk).map_err(TranslateError::Decode)?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&chunk[..n]);
    }

    Ok(out)
}
