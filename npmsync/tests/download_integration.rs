//! Integration tests for the full download pipeline.
//!
//! These tests verify the complete flow including:
//! - Root spec → graph resolution → concurrent transfers → report
//! - Skip decisions against verified files from a previous run
//! - Retry behavior and failure isolation under a flaky byte source
//! - Lifecycle event ordering over a whole run
//!
//! Run with: `cargo test --test download_integration`

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tempfile::TempDir;

use npmsync::events::{Event, EventBus};
use npmsync::registry::{
    Distribution, PackageRecord, PackageResolver, RegistryClient, RegistryDocument, RegistryError,
    RegistryResult,
};
use npmsync::scheduler::TaskQueue;
use npmsync::transfer::{ByteStream, FetchResponse, TarballFetcher, TransferError};
use npmsync::{Downloader, PackageSpec};

// ============================================================================
// Helper Functions
// ============================================================================

/// SHA-1 digest of the fixture tarball body `b"tarball-bytes"`.
const TARBALL_SHA1: &str = "9ef2570c89e65b9fe47687b0b49e122e59354bef";

/// Build a package record with the given dependencies.
fn record(name: &str, version: &str, deps: &[(&str, &str)]) -> PackageRecord {
    PackageRecord {
        id: format!("{}@{}", name, version),
        name: name.to_string(),
        dist: Distribution {
            tarball: format!("http://registry.test/{}/-/{}-{}.tgz", name, name, version),
            shasum: TARBALL_SHA1.to_string(),
        },
        dependencies: if deps.is_empty() {
            None
        } else {
            Some(
                deps.iter()
                    .map(|(n, c)| (n.to_string(), c.to_string()))
                    .collect(),
            )
        },
    }
}

/// In-memory registry serving one document per package name, with a
/// `latest` dist-tag pointing at the highest inserted version.
struct FixtureRegistry {
    documents: HashMap<String, RegistryDocument>,
    requests: Arc<AtomicUsize>,
}

impl FixtureRegistry {
    fn new(records: Vec<PackageRecord>) -> Self {
        let mut documents: HashMap<String, RegistryDocument> = HashMap::new();
        for rec in records {
            let version = rec.id.rsplit('@').next().unwrap().to_string();
            let doc = documents
                .entry(format!("http://registry.test/{}", rec.name))
                .or_insert_with(|| RegistryDocument {
                    versions: HashMap::new(),
                    dist_tags: HashMap::new(),
                });
            doc.dist_tags.insert("latest".to_string(), version.clone());
            doc.versions.insert(version, rec);
        }
        Self {
            documents,
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl RegistryClient for FixtureRegistry {
    fn get_document<'a>(&'a self, url: &'a str) -> BoxFuture<'a, RegistryResult<RegistryDocument>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            self.documents
                .get(url)
                .cloned()
                .ok_or_else(|| RegistryError::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                })
        })
    }
}

/// Fetcher serving `b"tarball-bytes"` in two chunks, optionally failing
/// the first N fetches per URL.
struct FixtureFetcher {
    failures_per_url: usize,
    seen: Mutex<HashMap<String, usize>>,
    fetches: Arc<AtomicUsize>,
}

impl FixtureFetcher {
    fn reliable() -> Self {
        Self::flaky(0)
    }

    fn flaky(failures_per_url: usize) -> Self {
        Self {
            failures_per_url,
            seen: Mutex::new(HashMap::new()),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl TarballFetcher for FixtureFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchResponse, TransferError>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let attempt = {
            let mut seen = self.seen.lock();
            let counter = seen.entry(url.to_string()).or_insert(0);
            *counter += 1;
            *counter
        };
        let fail = attempt <= self.failures_per_url;
        let url = url.to_string();
        Box::pin(async move {
            if fail {
                return Err(TransferError::Request {
                    url,
                    reason: "connection reset".to_string(),
                });
            }
            let body: ByteStream = Box::pin(futures::stream::iter(vec![
                Ok(bytes::Bytes::from_static(b"tarball-")),
                Ok(bytes::Bytes::from_static(b"bytes")),
            ]));
            Ok(FetchResponse {
                bytes_total: 13,
                body,
            })
        })
    }
}

fn downloader(
    temp: &TempDir,
    registry: FixtureRegistry,
    fetcher: Arc<dyn TarballFetcher>,
    events: EventBus,
) -> Downloader {
    let resolver = Arc::new(PackageResolver::with_client(
        "http://registry.test",
        Box::new(registry),
    ));
    Downloader::with_parts(
        TaskQueue::with_concurrency(4),
        resolver,
        fetcher,
        temp.path(),
        3,
        events,
    )
}

// ============================================================================
// Integration Tests
// ============================================================================

/// A root with a diamond-shaped dependency graph resolves once per
/// package and lands one verified tarball per package on disk.
#[tokio::test]
async fn test_full_run_mirrors_dependency_tree() {
    let temp = TempDir::new().unwrap();
    let registry = FixtureRegistry::new(vec![
        record("app", "1.0.0", &[("left", "^1.0.0"), ("right", "^2.0.0")]),
        record("left", "1.4.0", &[("shared", "^3.0.0")]),
        record("right", "2.2.0", &[("shared", "^3.0.0")]),
        record("shared", "3.0.1", &[]),
    ]);
    let requests = Arc::clone(&registry.requests);
    let fetcher = Arc::new(FixtureFetcher::reliable());
    let fetches = Arc::clone(&fetcher.fetches);

    let engine = downloader(&temp, registry, fetcher, EventBus::disabled());
    let report = engine.run(&PackageSpec::new("app", "latest")).await;

    assert!(report.is_success());
    assert_eq!(report.total(), 4);
    assert_eq!(report.downloaded.len(), 4);

    // shared is reached twice but resolved and fetched once
    assert_eq!(requests.load(Ordering::SeqCst), 5);
    assert_eq!(fetches.load(Ordering::SeqCst), 4);

    for (name, file) in [
        ("app", "app-1.0.0.tgz"),
        ("left", "left-1.4.0.tgz"),
        ("right", "right-2.2.0.tgz"),
        ("shared", "shared-3.0.1.tgz"),
    ] {
        let path = temp.path().join(name).join(file);
        assert_eq!(std::fs::read(&path).unwrap(), b"tarball-bytes");
    }
}

/// A second run over the same output directory skips every verified
/// file without touching the network for tarballs.
#[tokio::test]
async fn test_second_run_skips_verified_files() {
    let temp = TempDir::new().unwrap();
    let records = vec![
        record("app", "1.0.0", &[("dep", "^1.0.0")]),
        record("dep", "1.0.0", &[]),
    ];

    let first = downloader(
        &temp,
        FixtureRegistry::new(records.clone()),
        Arc::new(FixtureFetcher::reliable()),
        EventBus::disabled(),
    );
    assert!(first.run(&PackageSpec::new("app", "latest")).await.is_success());

    let fetcher = Arc::new(FixtureFetcher::reliable());
    let fetches = Arc::clone(&fetcher.fetches);
    let second = downloader(
        &temp,
        FixtureRegistry::new(records),
        fetcher,
        EventBus::disabled(),
    );
    let report = second.run(&PackageSpec::new("app", "latest")).await;

    assert!(report.is_success());
    assert_eq!(report.skipped.len(), 2);
    assert!(report.downloaded.is_empty());
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
}

/// Transient fetch failures are retried and eventually succeed without
/// surfacing in the report.
#[tokio::test]
async fn test_transient_failures_recovered_by_retry() {
    let temp = TempDir::new().unwrap();
    let registry = FixtureRegistry::new(vec![record("app", "1.0.0", &[])]);

    // Two failures per URL, three attempts configured
    let fetcher = Arc::new(FixtureFetcher::flaky(2));
    let fetches = Arc::clone(&fetcher.fetches);

    let engine = downloader(&temp, registry, fetcher, EventBus::disabled());
    let report = engine.run(&PackageSpec::new("app", "latest")).await;

    assert!(report.is_success());
    assert_eq!(report.downloaded, vec!["app@1.0.0".to_string()]);
    assert_eq!(fetches.load(Ordering::SeqCst), 3);
    assert_eq!(
        std::fs::read(temp.path().join("app").join("app-1.0.0.tgz")).unwrap(),
        b"tarball-bytes"
    );
}

/// A permanently broken package exhausts its attempts and is reported
/// as failed while its siblings complete.
#[tokio::test]
async fn test_permanent_failure_is_isolated() {
    let temp = TempDir::new().unwrap();
    let registry = FixtureRegistry::new(vec![
        record("app", "1.0.0", &[("dep", "^1.0.0")]),
        record("dep", "1.0.0", &[]),
    ]);

    struct BrokenAppFetcher {
        inner: FixtureFetcher,
    }

    impl TarballFetcher for BrokenAppFetcher {
        fn fetch<'a>(
            &'a self,
            url: &'a str,
        ) -> BoxFuture<'a, Result<FetchResponse, TransferError>> {
            if url.contains("/app/") {
                let url = url.to_string();
                Box::pin(async move {
                    Err(TransferError::Request {
                        url,
                        reason: "connection reset".to_string(),
                    })
                })
            } else {
                self.inner.fetch(url)
            }
        }
    }

    let engine = downloader(
        &temp,
        registry,
        Arc::new(BrokenAppFetcher {
            inner: FixtureFetcher::reliable(),
        }),
        EventBus::disabled(),
    );
    let report = engine.run(&PackageSpec::new("app", "latest")).await;

    assert!(!report.is_success());
    assert_eq!(report.downloaded, vec!["dep@1.0.0".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, "app@1.0.0");
    assert!(temp.path().join("dep").join("dep-1.0.0.tgz").exists());
    assert!(!temp.path().join("app").join("app-1.0.0.tgz").exists());
}

/// The event stream brackets the run and carries the per-package
/// lifecycle in between.
#[tokio::test]
async fn test_event_stream_covers_run_lifecycle() {
    let temp = TempDir::new().unwrap();
    let registry = FixtureRegistry::new(vec![record("app", "1.0.0", &[])]);

    let (bus, mut rx) = EventBus::channel();
    let engine = downloader(&temp, registry, Arc::new(FixtureFetcher::reliable()), bus);

    let report = engine.run(&PackageSpec::new("app", "latest")).await;
    assert!(report.is_success());
    drop(engine);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert!(matches!(events.first(), Some(Event::FetchingMetadata { spec }) if spec == "app@latest"));
    assert!(matches!(events.last(), Some(Event::Finished { spec }) if spec == "app@latest"));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::MetadataResolved { packages: 1, .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::TransferStarted { package, .. } if package == "app@1.0.0")));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::TransferProgress { bytes_completed: 13, bytes_total: 13, .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::TransferFinished { package, .. } if package == "app@1.0.0")));
}
