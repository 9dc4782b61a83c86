//! Task queue internals: pending stack, active set, admission.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use super::slot::TaskSlot;

/// Default concurrency ceiling.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Configuration for a [`TaskQueue`].
#[derive(Clone, Debug)]
pub struct QueueConfig {
    /// Maximum number of concurrently admitted tasks. Minimum 1; values
    /// of 0 are clamped rather than rejected.
    pub concurrency: usize,

    /// Whether the queue admits tasks immediately. When false, submitted
    /// tasks stay pending until [`TaskQueue::start`] is called, which
    /// supports deferred/batched startup.
    pub started: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            started: true,
        }
    }
}

/// A task waiting for admission.
struct Waiting {
    id: u64,
    admit: oneshot::Sender<()>,
}

/// Shared mutable queue state.
///
/// Single-writer-at-a-time by construction: every mutation happens under
/// the mutex, making insert-and-check effectively atomic relative to
/// concurrent submitters.
pub(super) struct Inner {
    concurrency: usize,
    started: bool,
    next_id: u64,
    /// Pending tasks; admission pops from the end (LIFO).
    pending: Vec<Waiting>,
    /// Ids of tasks currently holding a slot.
    active: HashSet<u64>,
}

impl Inner {
    /// Admits pending tasks while capacity remains.
    ///
    /// Called re-entrantly on every submit and every release, never as a
    /// separate sweep.
    fn run_pending(&mut self) {
        while self.started && self.active.len() < self.concurrency {
            let Some(next) = self.pending.pop() else {
                break;
            };
            // An abandoned waiter (acquire future dropped) must not
            // occupy a slot.
            if next.admit.send(()).is_ok() {
                self.active.insert(next.id);
            }
        }
    }

    pub(super) fn release(&mut self, id: u64) {
        // Idempotent: releasing twice removes nothing the second time.
        if self.active.remove(&id) {
            self.run_pending();
        }
    }
}

/// Bounded-concurrency task queue with LIFO admission.
///
/// Cloning is cheap; all clones share the same pending stack, active set
/// and concurrency ceiling.
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<Mutex<Inner>>,
}

impl TaskQueue {
    /// Creates a queue from the given configuration.
    pub fn new(config: QueueConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                concurrency: config.concurrency.max(1),
                started: config.started,
                next_id: 0,
                pending: Vec::new(),
                active: HashSet::new(),
            })),
        }
    }

    /// Creates a started queue with the given concurrency ceiling.
    pub fn with_concurrency(concurrency: usize) -> Self {
        Self::new(QueueConfig {
            concurrency,
            ..Default::default()
        })
    }

    /// Submits a task and waits for admission.
    ///
    /// The returned [`TaskSlot`] occupies one concurrency slot until it
    /// is released (explicitly or on drop). A slot that is never
    /// released permanently occupies capacity - releasing is a caller
    /// obligation, which the `Drop` impl discharges on every exit path.
    pub async fn acquire(&self) -> TaskSlot {
        let (admit_tx, admit_rx) = oneshot::channel();
        let id = {
            let mut inner = self.inner.lock();
            inner.next_id += 1;
            let id = inner.next_id;
            inner.pending.push(Waiting {
                id,
                admit: admit_tx,
            });
            inner.run_pending();
            id
        };

        debug!(task_id = id, "Task queued");

        // The sender lives in the pending stack inside our own Arc, so
        // it cannot be dropped before admission.
        let _ = admit_rx.await;

        debug!(task_id = id, "Task admitted");
        TaskSlot::new(id, Arc::clone(&self.inner))
    }

    /// Runs a future under a concurrency slot.
    ///
    /// Acquires a slot, awaits the future, and releases the slot on
    /// every exit path (including panics unwinding through the guard).
    pub async fn run<F>(&self, work: F) -> F::Output
    where
        F: std::future::Future,
    {
        let _slot = self.acquire().await;
        work.await
    }

    /// Begins admitting tasks on a queue created with `started: false`.
    ///
    /// Calling `start` on an already-started queue is a no-op.
    pub fn start(&self) {
        let mut inner = self.inner.lock();
        if !inner.started {
            inner.started = true;
            inner.run_pending();
        }
    }

    /// Number of tasks currently holding a slot.
    pub fn active_count(&self) -> usize {
        self.inner.lock().active.len()
    }

    /// Number of tasks waiting for admission.
    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// The configured concurrency ceiling.
    pub fn concurrency(&self) -> usize {
        self.inner.lock().concurrency
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("TaskQueue")
            .field("concurrency", &inner.concurrency)
            .field("started", &inner.started)
            .field("active", &inner.active.len())
            .field("pending", &inner.pending.len())
            .finish()
    }
}
