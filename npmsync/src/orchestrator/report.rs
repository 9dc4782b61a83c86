//! Aggregate outcome of a download run.

use super::DownloadError;

/// A package whose fetch terminally failed.
#[derive(Debug)]
pub struct PackageFailure {
    /// The package id (`name@version`).
    pub id: String,
    /// The terminal error.
    pub error: DownloadError,
}

/// Per-package outcomes of one `run` invocation.
///
/// A run never aborts on a single package's failure; the report carries
/// every outcome so callers can distinguish total success from partial
/// failure without losing already-downloaded artifacts.
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// Ids downloaded during this run.
    pub downloaded: Vec<String>,
    /// Ids skipped because a verified local copy existed.
    pub skipped: Vec<String>,
    /// Packages whose fetch exhausted all attempts.
    pub failed: Vec<PackageFailure>,
}

impl DownloadReport {
    /// True when no package failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total number of packages this run decided on.
    pub fn total(&self) -> usize {
        self.downloaded.len() + self.skipped.len() + self.failed.len()
    }

    /// Folds another report into this one (multi-root invocations).
    pub fn merge(&mut self, other: DownloadReport) {
        self.downloaded.extend(other.downloaded);
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_success() {
        let report = DownloadReport::default();
        assert!(report.is_success());
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn test_merge_accumulates() {
        let mut report = DownloadReport {
            downloaded: vec!["a@1.0.0".to_string()],
            skipped: vec![],
            failed: vec![],
        };

        report.merge(DownloadReport {
            downloaded: vec!["b@2.0.0".to_string()],
            skipped: vec!["c@3.0.0".to_string()],
            failed: vec![],
        });

        assert_eq!(report.total(), 3);
        assert!(report.is_success());
    }
}
