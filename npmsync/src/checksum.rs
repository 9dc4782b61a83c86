//! SHA-1 checksum calculation for downloaded tarballs.
//!
//! The npm registry publishes a `dist.shasum` SHA-1 digest for every
//! tarball. Local files are hashed in a single streaming pass and
//! compared case-insensitively against the declared value.

use std::io;
use std::path::Path;

use sha1::{Digest, Sha1};
use tokio::io::AsyncReadExt;

/// Buffer size for reading files during checksum calculation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Calculates the SHA-1 digest of a file.
///
/// Returns the lowercase hexadecimal digest of the file contents, read
/// in a single streaming pass.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub async fn file_sha1(path: &Path) -> io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;

    let mut hasher = Sha1::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Checks whether a file's SHA-1 digest matches an expected checksum.
///
/// The comparison ignores hex case; registries are not consistent about
/// emitting lowercase.
pub async fn matches(path: &Path, expected: &str) -> io::Result<bool> {
    let actual = file_sha1(path).await?;
    Ok(actual.eq_ignore_ascii_case(expected))
}
