//! Registry client: package specs, records, and version resolution.
//!
//! This module owns the network boundary to the npm-style registry:
//!
//! - [`PackageSpec`] / [`parse_package_string`] - `name@constraint` parsing
//! - [`PackageRecord`] - resolved metadata for one concrete version
//! - [`PackageResolver`] - dist-tag and semver-range version selection
//! - [`RegistryClient`] - the HTTP seam, mockable in tests
//!
//! The rest of the engine only depends on the asynchronous contract
//! "given a spec, obtain a package record or an error".

mod record;
mod resolver;
mod spec;

pub use record::{Distribution, PackageRecord, RegistryDocument};
pub use resolver::{
    HttpRegistryClient, PackageResolver, RegistryClient, RegistryError, RegistryResult,
    DEFAULT_REGISTRY,
};
pub use spec::{parse_package_string, PackageSpec};
