//! CLI error type.

use std::fmt;

use npmsync::DownloadError;

/// Errors surfaced directly by the CLI (as opposed to per-package
/// failures, which are reported through the download report).
#[derive(Debug)]
pub enum CliError {
    /// The download engine could not be constructed.
    Engine(DownloadError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Engine(e) => write!(f, "Failed to initialize downloader: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Engine(e) => Some(e),
        }
    }
}

impl From<DownloadError> for CliError {
    fn from(e: DownloadError) -> Self {
        CliError::Engine(e)
    }
}
