//! Content digests used to compare ABI documents

use eyre::{Context, Result};
use sha2::{Digest, Sha256};
use std::{fs::File, io::Read, path::Path};

/// Read size used when streaming files into the hasher
pub const CHUNK_SIZE: usize = 4096;

/// Hex-encoded SHA-256 of a file, streamed in [`CHUNK_SIZE`] chunks
pub fn file_digest(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let read = file
            .read(&mut buffer)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
