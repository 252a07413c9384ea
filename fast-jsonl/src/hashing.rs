//! Content hashing with compact base-62 tokens.
//!
//! All digests are SHA-256. The 256-bit digest is treated as one big-endian
//! unsigned integer and re-encoded in base 62, which yields short tokens that
//! are safe to use as file names on every platform.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Chunk size for streaming file digests (8 KiB).
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Base-62 digit alphabet: digits, lowercase letters, uppercase letters.
const BASE62_ALPHABET: &[u8; 62] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Hash UTF-8 text into a base-62 token.
pub fn digest_text(text: &str) -> String {
    digest_bytes(text.as_bytes())
}

/// Hash a byte slice into a base-62 token.
pub fn digest_bytes(bytes: &[u8]) -> String {
    encode_base62(&Sha256::digest(bytes))
}

/// Hash a file's contents into a base-62 token.
///
/// The file is streamed in [`CHUNK_SIZE`] pieces, so memory use does not grow
/// with file size. The result is identical to [`digest_bytes`] over the whole
/// file.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the file does not exist and [`Error::Io`]
/// for any other read failure.
pub fn digest_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| Error::io(path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(encode_base62(&hasher.finalize()))
}

/// Encode a big-endian unsigned integer as base 62.
///
/// Most significant digit first, no zero padding. Zero (including an empty
/// slice) encodes as `"0"`.
pub fn encode_base62(bytes: &[u8]) -> String {
    let mut number: Vec<u8> = bytes.iter().copied().skip_while(|&b| b == 0).collect();
    if number.is_empty() {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while !number.is_empty() {
        // Long division of the byte string by 62.
        let mut remainder: u32 = 0;
        let mut quotient = Vec::with_capacity(number.len());
        for &byte in &number {
            let acc = (remainder << 8) | u32::from(byte);
            let q = acc / 62;
            remainder = acc % 62;
            if !quotient.is_empty() || q != 0 {
                quotient.push(q as u8);
            }
        }
        digits.push(BASE62_ALPHABET[remainder as usize]);
        number = quotient;
    }

    digits.iter().rev().map(|&d| d as char).collect()
}
