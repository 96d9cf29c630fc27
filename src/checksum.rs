//! Content checksums
//!
//! Versions are deduplicated and verified by the SHA-256 digest of their full
//! content, hex encoded (64 characters). Hashing never modifies anything.
//!
//! ```rust
//! use verchain::checksum::hash_bytes;
//!
//! let a = hash_bytes(b"quarterly report");
//! let b = hash_bytes(b"quarterly report");
//! assert_eq!(a, b);
//! assert_eq!(a.len(), 64);
//! ```

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::trace;

const BUFFER_SIZE: usize = 8192;

/// Hash everything a reader yields
pub fn hash_reader<R: Read>(mut reader: R) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hash a file's full content
///
/// # Errors
///
/// - [`VersionError::Io`](crate::VersionError::Io) if the file cannot be opened or read
pub fn hash_file(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let digest = hash_reader(file)?;
    trace!("Hashed {:?}: {}", path, &digest[..8]);
    Ok(digest)
}

/// Hash in-memory data
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Check whether a file's content still hashes to `expected`
pub fn verify_file(path: &Path, expected: &str) -> Result<bool> {
    Ok(hash_file(path)? == expected)
}
