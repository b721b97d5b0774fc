//! BLAKE3 content hashing.
//!
//! Every helper returns the lowercase hex digest, so a file hashed by
//! streaming and the same bytes hashed in memory always agree.

use std::io::Read;
use std::path::Path;

/// Hashes a byte slice.
pub fn blake3_bytes(data: &[u8]) -> String {
    hex::encode(blake3::hash(data).as_bytes())
}

/// Hashes the UTF-8 bytes of a string.
pub fn blake3_str(value: &str) -> String {
    blake3_bytes(value.as_bytes())
}

/// Hashes everything a reader yields.
pub fn blake3_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    std::io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize().as_bytes()))
}

/// Hashes the contents of a file.
pub fn blake3_file(path: &Path) -> std::io::Result<String> {
    let file = std::fs::File::open(path)?;
    blake3_reader(file)
}
