//! Filesystem primitives used by the download engine.
//!
//! The engine only needs directory creation and existence checks; both
//! are thin async wrappers over `tokio::fs`.

use std::io;
use std::path::Path;

/// Creates a directory and all missing ancestors.
///
/// Succeeds if the directory already exists.
pub async fn ensure_directory(path: &Path) -> io::Result<()> {
    tokio::fs::create_dir_all(path).await
}

/// Returns true if the path exists.
///
/// I/O errors (permission problems, broken symlink chains) are treated
/// as "does not exist".
pub async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
