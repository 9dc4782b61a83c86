//! npmsync - Transitive npm package downloader
//!
//! This library resolves a package's full dependency graph against an
//! npm-compatible registry and mirrors every tarball to local disk:
//!
//! ```text
//! PackageSpec ──► PackageResolver ──► GraphBuilder ──► ResolvedSet
//!                                                          │
//!                        TaskQueue ◄───── Downloader ◄─────┘
//!                            │
//!                         Transfer ──► downloads/<name>/<tarball>
//! ```
//!
//! All registry and tarball traffic flows through a shared [`TaskQueue`]
//! with a fixed concurrency ceiling. Packages already on disk with a
//! matching checksum are skipped; transient failures are retried per
//! package without affecting the rest of the run.
//!
//! # Example
//!
//! ```ignore
//! use npmsync::{Downloader, DownloaderConfig, EventBus, parse_package_string};
//!
//! let spec = parse_package_string("express@^4.0.0");
//! let downloader = Downloader::new(DownloaderConfig::default(), EventBus::disabled())?;
//! let report = downloader.run(&spec).await;
//! println!("{} downloaded, {} skipped", report.downloaded.len(), report.skipped.len());
//! ```

pub mod checksum;
pub mod events;
pub mod fsutil;
pub mod graph;
pub mod orchestrator;
pub mod registry;
pub mod scheduler;
pub mod transfer;

pub use events::{Event, EventBus};
pub use graph::{GraphBuilder, ResolvedSet};
pub use orchestrator::{
    DownloadError, DownloadReport, Downloader, DownloaderConfig, PackageFailure,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_OUTPUT_ROOT,
};
pub use registry::{
    parse_package_string, PackageRecord, PackageResolver, PackageSpec, RegistryError,
    DEFAULT_REGISTRY,
};
pub use scheduler::{TaskQueue, DEFAULT_CONCURRENCY};
pub use transfer::{Transfer, TransferError, TransferState};
