//! Version resolution against a remote registry.

use futures::future::BoxFuture;
use semver::{Version, VersionReq};
use thiserror::Error;
use tracing::debug;

use super::record::{PackageRecord, RegistryDocument};
use super::spec::PackageSpec;

/// Default registry base URL.
pub const DEFAULT_REGISTRY: &str = "http://registry.npmjs.com";

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur while resolving a package spec.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The metadata request could not be completed.
    #[error("request for {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    /// The registry answered with a non-success status.
    #[error("registry returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// The response body was not a valid registry document.
    #[error("failed to parse registry metadata from {url}: {reason}")]
    Parse { url: String, reason: String },

    /// No published version satisfies the requested constraint.
    #[error("no version of {name} satisfies '{constraint}'")]
    NoMatchingVersion { name: String, constraint: String },

    /// A dist-tag points at a version missing from the document.
    #[error("registry entry for {name} is missing version {version}")]
    MissingVersion { name: String, version: String },
}

/// The HTTP seam for registry metadata lookups.
///
/// Abstracting the transport keeps the resolver testable with canned
/// documents instead of a live registry.
pub trait RegistryClient: Send + Sync {
    /// Fetches and parses the registry document at `url`.
    fn get_document<'a>(&'a self, url: &'a str) -> BoxFuture<'a, RegistryResult<RegistryDocument>>;
}

/// Registry client backed by reqwest.
///
/// No request timeout is configured: the engine promises not to enforce
/// internal timeouts, so a stalled registry occupies its concurrency
/// slot until the transport gives up.
pub struct HttpRegistryClient {
    client: reqwest::Client,
}

impl HttpRegistryClient {
    /// Creates a client with default transport settings.
    pub fn new() -> RegistryResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| RegistryError::Fetch {
                url: String::new(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

impl RegistryClient for HttpRegistryClient {
    fn get_document<'a>(&'a self, url: &'a str) -> BoxFuture<'a, RegistryResult<RegistryDocument>> {
        Box::pin(async move {
            let response =
                self.client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| RegistryError::Fetch {
                        url: url.to_string(),
                        reason: e.to_string(),
                    })?;

            let status = response.status();
            if !status.is_success() {
                return Err(RegistryError::HttpStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let body = response.bytes().await.map_err(|e| RegistryError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

            serde_json::from_slice(&body).map_err(|e| RegistryError::Parse {
                url: url.to_string(),
                reason: e.to_string(),
            })
        })
    }
}

/// Resolves package specs to concrete package records.
///
/// Selection rule: the constraint is looked up as a dist-tag first
/// (`latest`, `next`, ...); otherwise it is treated as a semver range
/// and the highest satisfying published version wins.
pub struct PackageResolver {
    registry: String,
    client: Box<dyn RegistryClient>,
}

impl PackageResolver {
    /// Creates a resolver against the given registry base URL.
    pub fn new(registry: impl Into<String>) -> RegistryResult<Self> {
        Ok(Self::with_client(registry, Box::new(HttpRegistryClient::new()?)))
    }

    /// Creates a resolver with a custom transport (used in tests).
    pub fn with_client(registry: impl Into<String>, client: Box<dyn RegistryClient>) -> Self {
        let registry = registry.into();
        Self {
            registry: registry.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// The registry base URL this resolver talks to.
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Resolves a spec to the matching package record.
    ///
    /// # Errors
    ///
    /// Fails on network errors, unknown package names, unparseable
    /// metadata, and constraints no published version satisfies.
    pub async fn resolve(&self, spec: &PackageSpec) -> RegistryResult<PackageRecord> {
        let url = format!("{}/{}", self.registry, spec.name);
        debug!(spec = %spec, url = %url, "Resolving package");

        let document = self.client.get_document(&url).await?;
        select_version(spec, &document)
    }
}

/// Picks the version of `document` that satisfies `spec`.
fn select_version(spec: &PackageSpec, document: &RegistryDocument) -> RegistryResult<PackageRecord> {
    // Dist-tag lookup first: "latest" and friends are tags, not ranges.
    if let Some(tagged) = document.dist_tags.get(&spec.version) {
        return document
            .versions
            .get(tagged)
            .cloned()
            .ok_or_else(|| RegistryError::MissingVersion {
                name: spec.name.clone(),
                version: tagged.clone(),
            });
    }

    // Otherwise treat the constraint as a semver range and take the
    // highest satisfying version. An empty constraint (bare trailing
    // `@`) matches everything, as npm treats an empty range; an
    // unparseable range matches nothing.
    let req = if spec.version.is_empty() {
        Some(VersionReq::STAR)
    } else {
        VersionReq::parse(&spec.version).ok()
    };
    let best = req
        .and_then(|req| {
            document
                .versions
                .keys()
                .filter_map(|v| Version::parse(v).ok())
                .filter(|v| req.matches(v))
                .max()
        })
        .and_then(|version| document.versions.get(&version.to_string()).cloned());

    best.ok_or_else(|| RegistryError::NoMatchingVersion {
        name: spec.name.clone(),
        constraint: spec.version.clone(),
    })
}
