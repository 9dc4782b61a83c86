//! Registry metadata shapes.
//!
//! These mirror the npm registry JSON closely enough to deserialize the
//! parts the engine needs; everything else in the response is ignored.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

/// Distribution descriptor for one package version.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Distribution {
    /// URL of the tarball artifact.
    pub tarball: String,
    /// Declared SHA-1 digest of the tarball (hex).
    pub shasum: String,
}

/// Resolved metadata for one concrete package version.
///
/// Created only from a registry response and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageRecord {
    /// Globally unique identifier, `name@resolvedVersion`.
    #[serde(rename = "_id")]
    pub id: String,

    /// Package name, possibly scoped.
    pub name: String,

    /// Where and how to fetch the artifact.
    pub dist: Distribution,

    /// Declared runtime dependencies: name to version constraint.
    #[serde(default)]
    pub dependencies: Option<BTreeMap<String, String>>,
}

impl PackageRecord {
    /// Iterates dependency entries as (name, constraint) pairs.
    pub fn dependency_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.dependencies
            .iter()
            .flatten()
            .map(|(name, constraint)| (name.as_str(), constraint.as_str()))
    }
}

/// The registry response for `GET <registry>/<name>`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryDocument {
    /// All published versions, keyed by version string.
    pub versions: HashMap<String, PackageRecord>,

    /// Tag to version mapping (`latest`, `next`, ...).
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: HashMap<String, String>,
}
