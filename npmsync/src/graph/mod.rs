//! Recursive dependency graph resolution.
//!
//! Starting from a root spec, [`GraphBuilder::collect`] resolves every
//! reachable package exactly once. Each resolution goes through the
//! shared [`TaskQueue`] so metadata fetches respect the same concurrency
//! ceiling as downloads; declared dependencies are walked concurrently.
//!
//! Deduplication and cycle protection are the same mechanism: insertion
//! into the shared result map is the single atomic check, so a package
//! whose id is already present is never re-walked, no matter how many
//! paths reach it or whether the declared graph is cyclic.
//!
//! A branch that fails to resolve (after retries) is reported on the
//! event bus and contributes nothing further; sibling branches are
//! unaffected.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{join_all, BoxFuture};
use tracing::warn;

use crate::events::{Event, EventBus};
use crate::registry::{PackageRecord, PackageResolver, PackageSpec, RegistryError};
use crate::scheduler::TaskQueue;

/// The deduplicated result of a graph walk: package id to record.
///
/// Concurrent branches insert through the entry API, which makes
/// check-and-insert atomic per id; exactly one branch wins a race and
/// the rest stop.
pub type ResolvedSet = DashMap<String, PackageRecord>;

/// Walks dependency graphs through a resolver and a shared task queue.
pub struct GraphBuilder {
    queue: TaskQueue,
    resolver: Arc<PackageResolver>,
    /// Resolution attempts per spec before a branch is abandoned.
    max_attempts: usize,
    events: EventBus,
}

impl GraphBuilder {
    /// Creates a builder sharing the given queue and resolver.
    pub fn new(
        queue: TaskQueue,
        resolver: Arc<PackageResolver>,
        max_attempts: usize,
        events: EventBus,
    ) -> Self {
        Self {
            queue,
            resolver,
            max_attempts: max_attempts.max(1),
            events,
        }
    }

    /// Resolves the complete set of distinct packages reachable from
    /// `root`.
    ///
    /// The returned set contains exactly one record per resolved package
    /// id. Branches that failed to resolve are missing from the set and
    /// were reported as [`Event::ResolutionFailed`].
    pub async fn collect(&self, root: &PackageSpec) -> Arc<ResolvedSet> {
        let set = Arc::new(ResolvedSet::new());
        self.walk(root.clone(), Arc::clone(&set)).await;
        set
    }

    /// Resolves one spec and recurses into its dependencies.
    fn walk(&self, spec: PackageSpec, set: Arc<ResolvedSet>) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let record = match self.resolve_with_retry(&spec).await {
                Ok(record) => record,
                Err(error) => {
                    warn!(spec = %spec, error = %error, "Abandoning dependency branch");
                    self.events.emit(Event::ResolutionFailed {
                        spec: spec.to_string(),
                        error: error.to_string(),
                    });
                    return;
                }
            };

            // Dedup point and cycle guard in one: only the inserting
            // branch continues below.
            match set.entry(record.id.clone()) {
                Entry::Occupied(_) => return,
                Entry::Vacant(vacant) => {
                    vacant.insert(record.clone());
                }
            }

            let branches: Vec<_> = record
                .dependency_entries()
                .map(|(name, constraint)| {
                    self.walk(PackageSpec::new(name, constraint), Arc::clone(&set))
                })
                .collect();
            join_all(branches).await;
        })
    }

    /// Resolves a spec through the queue, retrying transient failures.
    async fn resolve_with_retry(&self, spec: &PackageSpec) -> Result<PackageRecord, RegistryError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.queue.run(self.resolver.resolve(spec)).await {
                Ok(record) => return Ok(record),
                Err(error) if attempt >= self.max_attempts => return Err(error),
                Err(error) => {
                    warn!(
                        spec = %spec,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %error,
                        "Resolution attempt failed"
                    );
                }
            }
        }
    }
}
