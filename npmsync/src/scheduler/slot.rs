//! Concurrency slot guard.

use std::sync::Arc;

use parking_lot::Mutex;

use super::queue::Inner;

/// An admitted task's hold on one concurrency slot.
///
/// The slot stays occupied until [`release`](TaskSlot::release) is
/// called. Dropping the guard releases implicitly, so a slot is freed on
/// every exit path even when the work inside it fails or unwinds.
/// Releasing twice is a no-op.
pub struct TaskSlot {
    id: u64,
    inner: Arc<Mutex<Inner>>,
}

impl TaskSlot {
    pub(super) fn new(id: u64, inner: Arc<Mutex<Inner>>) -> Self {
        Self { id, inner }
    }

    /// The monotonic sequence number assigned at submission.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Releases the slot and admits further pending tasks.
    pub fn release(self) {
        // Drop does the work.
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        self.inner.lock().release(self.id);
    }
}

impl std::fmt::Debug for TaskSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSlot").field("id", &self.id).finish()
    }
}
