//! Bounded-concurrency task queue.
//!
//! Every unit of work in a download run - registry metadata fetches and
//! tarball transfers alike - is admitted through a shared [`TaskQueue`]
//! so the whole invocation respects one concurrency ceiling.
//!
//! # Architecture
//!
//! ```text
//! caller ──► acquire() ──► pending stack ──► admission ──► TaskSlot
//!                              ▲                               │
//!                              └────────── release ◄───────────┘
//! ```
//!
//! Admission is LIFO: whenever a slot frees, the most recently submitted
//! pending task runs next. This is a deliberate, simple policy inherited
//! from the pop-from-end pending stack - callers must never assume
//! arrival order is preserved under contention.
//!
//! # Example
//!
//! ```ignore
//! use npmsync::scheduler::{QueueConfig, TaskQueue};
//!
//! let queue = TaskQueue::new(QueueConfig { concurrency: 4, ..Default::default() });
//!
//! // Scheduler-driven work: slot held for the duration of the future.
//! let body = queue.run(async { fetch_metadata().await }).await;
//!
//! // Manual completion: slot held until the TaskSlot is released/dropped.
//! let slot = queue.acquire().await;
//! do_decoupled_work();
//! slot.release();
//! ```

mod queue;
mod slot;

pub use queue::{QueueConfig, TaskQueue, DEFAULT_CONCURRENCY};
pub use slot::TaskSlot;
