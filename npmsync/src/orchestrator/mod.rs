//! Download orchestration: resolve, skip-or-fetch, retry, report.
//!
//! The [`Downloader`] is the top-level policy tying the pieces together:
//!
//! ```text
//! run(spec)
//!   │
//!   ├─► GraphBuilder ──► ResolvedSet        (through the TaskQueue)
//!   │
//!   └─► per package, unordered:
//!         should_skip?  ──► yes ──► Skipped
//!           │ no
//!           ▼
//!         ensure directory, then up to max_attempts:
//!           Transfer through the TaskQueue
//!             ├─ success ──► Downloaded
//!             └─ failure ──► retry, same destination
//!                              └─ exhausted ──► Failed (isolated)
//! ```
//!
//! One bad package never aborts the others; the [`DownloadReport`]
//! aggregates every outcome.

mod report;

pub use report::{DownloadReport, PackageFailure};

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::checksum;
use crate::events::{Event, EventBus};
use crate::fsutil;
use crate::graph::GraphBuilder;
use crate::registry::{
    PackageRecord, PackageResolver, PackageSpec, RegistryError, DEFAULT_REGISTRY,
};
use crate::scheduler::{TaskQueue, DEFAULT_CONCURRENCY};
use crate::transfer::{HttpFetcher, TarballFetcher, Transfer, TransferError};

/// Default download attempts per package.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Default output root directory.
pub const DEFAULT_OUTPUT_ROOT: &str = "downloads";

/// Errors surfaced by the orchestrator.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The registry client could not be constructed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The tarball fetcher could not be constructed.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Every configured attempt for one package failed.
    #[error("exceeded {attempts} attempts downloading {id}")]
    ExhaustedRetries {
        id: String,
        attempts: usize,
        #[source]
        source: TransferError,
    },

    /// The destination directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Configuration for a [`Downloader`].
#[derive(Clone, Debug)]
pub struct DownloaderConfig {
    /// Registry base URL.
    pub registry: String,
    /// Root directory artifacts are written under.
    pub output_root: PathBuf,
    /// Concurrency ceiling shared by metadata fetches and transfers.
    pub concurrency: usize,
    /// Attempts per package (downloads and resolutions alike).
    pub max_attempts: usize,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            registry: DEFAULT_REGISTRY.to_string(),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            concurrency: DEFAULT_CONCURRENCY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Outcome of one package's skip-or-fetch decision.
enum PackageOutcome {
    Downloaded(String),
    Skipped(String),
    Failed(PackageFailure),
}

/// The top-level download engine.
pub struct Downloader {
    queue: TaskQueue,
    resolver: Arc<PackageResolver>,
    fetcher: Arc<dyn TarballFetcher>,
    output_root: PathBuf,
    max_attempts: usize,
    events: EventBus,
}

impl Downloader {
    /// Creates a downloader with HTTP-backed resolver and fetcher.
    pub fn new(config: DownloaderConfig, events: EventBus) -> Result<Self, DownloadError> {
        let resolver = Arc::new(PackageResolver::new(config.registry)?);
        Ok(Self::with_parts(
            TaskQueue::with_concurrency(config.concurrency),
            resolver,
            Arc::new(HttpFetcher::new()?),
            config.output_root,
            config.max_attempts,
            events,
        ))
    }

    /// Assembles a downloader from explicit collaborators.
    ///
    /// This is the dependency-injection surface used by tests and by
    /// callers that share a queue across engines.
    pub fn with_parts(
        queue: TaskQueue,
        resolver: Arc<PackageResolver>,
        fetcher: Arc<dyn TarballFetcher>,
        output_root: impl Into<PathBuf>,
        max_attempts: usize,
        events: EventBus,
    ) -> Self {
        Self {
            queue,
            resolver,
            fetcher,
            output_root: output_root.into(),
            max_attempts: max_attempts.max(1),
            events,
        }
    }

    /// Resolves `spec`'s dependency graph and fetches every package.
    ///
    /// Individual failures are collected, never propagated across
    /// packages; the report reflects all per-package outcomes.
    pub async fn run(&self, spec: &PackageSpec) -> DownloadReport {
        info!(spec = %spec, "Starting download run");
        self.events.emit(Event::FetchingMetadata {
            spec: spec.to_string(),
        });

        let builder = GraphBuilder::new(
            self.queue.clone(),
            Arc::clone(&self.resolver),
            self.max_attempts,
            self.events.clone(),
        );
        let resolved = builder.collect(spec).await;

        self.events.emit(Event::MetadataResolved {
            spec: spec.to_string(),
            packages: resolved.len(),
        });

        let packages: Vec<PackageRecord> =
            resolved.iter().map(|entry| entry.value().clone()).collect();
        let outcomes = join_all(packages.into_iter().map(|pkg| self.fetch_one(pkg))).await;

        let mut report = DownloadReport::default();
        for outcome in outcomes {
            match outcome {
                PackageOutcome::Downloaded(id) => report.downloaded.push(id),
                PackageOutcome::Skipped(id) => report.skipped.push(id),
                PackageOutcome::Failed(failure) => report.failed.push(failure),
            }
        }

        info!(
            spec = %spec,
            downloaded = report.downloaded.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Download run finished"
        );
        self.events.emit(Event::Finished {
            spec: spec.to_string(),
        });
        report
    }

    /// Decides skip-or-fetch for one package and drives the fetch.
    async fn fetch_one(&self, pkg: PackageRecord) -> PackageOutcome {
        if self.should_skip(&pkg).await {
            debug!(package = %pkg.id, "Skipping verified local copy");
            self.events.emit(Event::Skipped {
                package: pkg.id.clone(),
            });
            return PackageOutcome::Skipped(pkg.id);
        }

        let destination = self.destination_path(&pkg);
        if let Some(parent) = destination.parent() {
            if let Err(error) = fsutil::ensure_directory(parent).await {
                return PackageOutcome::Failed(PackageFailure {
                    id: pkg.id.clone(),
                    error: DownloadError::CreateDir {
                        path: parent.to_path_buf(),
                        source: error,
                    },
                });
            }
        }

        self.fetch_with_retry(&pkg, &destination).await
    }

    /// Attempts the transfer up to `max_attempts` times.
    ///
    /// Every attempt is a fresh [`Transfer`] targeting the same
    /// destination, admitted through the shared queue.
    async fn fetch_with_retry(&self, pkg: &PackageRecord, destination: &Path) -> PackageOutcome {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let transfer = Transfer::new(
                pkg.dist.tarball.clone(),
                destination,
                pkg.id.clone(),
                self.events.clone(),
            );

            match self.queue.run(transfer.run(self.fetcher.as_ref())).await {
                Ok(_bytes) => return PackageOutcome::Downloaded(pkg.id.clone()),
                Err(error) => {
                    warn!(
                        package = %pkg.id,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %error,
                        "Download attempt failed"
                    );
                    self.events.emit(Event::AttemptFailed {
                        package: pkg.id.clone(),
                        attempt,
                        max_attempts: self.max_attempts,
                        error: error.to_string(),
                    });

                    if attempt >= self.max_attempts {
                        let terminal = DownloadError::ExhaustedRetries {
                            id: pkg.id.clone(),
                            attempts: self.max_attempts,
                            source: error,
                        };
                        self.events.emit(Event::PackageFailed {
                            package: pkg.id.clone(),
                            error: terminal.to_string(),
                        });
                        return PackageOutcome::Failed(PackageFailure {
                            id: pkg.id.clone(),
                            error: terminal,
                        });
                    }
                }
            }
        }
    }

    /// True iff the destination exists and its SHA-1 digest matches the
    /// declared checksum.
    ///
    /// Existence alone is never sufficient; a mismatching digest means
    /// re-download, not an error.
    pub async fn should_skip(&self, pkg: &PackageRecord) -> bool {
        let destination = self.destination_path(pkg);
        if !fsutil::exists(&destination).await {
            return false;
        }
        checksum::matches(&destination, &pkg.dist.shasum)
            .await
            .unwrap_or(false)
    }

    /// Stable destination path: `<output_root>/<name>/<tarball basename>`.
    ///
    /// Deterministic per record, so repeated runs address the same file
    /// for the same resolved version.
    pub fn destination_path(&self, pkg: &PackageRecord) -> PathBuf {
        let basename = pkg
            .dist
            .tarball
            .rsplit('/')
            .next()
            .unwrap_or(pkg.dist.tarball.as_str());
        self.output_root.join(&pkg.name).join(basename)
    }
}
