//! Zlib payload compression
//!
//! When the `compression` flag is set, clients deflate the plaintext
//! before encrypting it, so decryption is followed by an inflate.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::{CryptoError, Result};

/// Deflate a payload (used by the in-process test client)
pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    // Writing to a Vec cannot fail
    encoder.write_all(data).expect("write to Vec");
    encoder.finish().expect("finish to Vec")
}

/// Inflate a decrypted payload
///
/// # Errors
///
/// Returns `DecryptFailed` when the data is not a valid zlib stream -
/// indistinguishable at this layer from a decrypt under the wrong key.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CryptoError::decrypt_failed(format!("invalid zlib stream: {e}")))?;
    Ok(out)
}
