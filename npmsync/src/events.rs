//! Lifecycle event stream for download runs.
//!
//! The engine never prints. Every observable moment of a run (metadata
//! fetch, skip decisions, transfer lifecycle, retries, terminal failures)
//! is published as an [`Event`] so a presentation layer can format output
//! however it likes.
//!
//! # Example
//!
//! ```ignore
//! use npmsync::events::EventBus;
//!
//! let (bus, mut rx) = EventBus::channel();
//! tokio::spawn(async move {
//!     while let Some(event) = rx.recv().await {
//!         println!("{:?}", event);
//!     }
//! });
//! ```

use std::path::PathBuf;

use tokio::sync::mpsc;

/// A lifecycle event emitted during a download run.
#[derive(Debug, Clone)]
pub enum Event {
    /// Metadata resolution for a root spec has begun.
    FetchingMetadata {
        /// The root package spec being resolved.
        spec: String,
    },

    /// The dependency graph has been fully resolved.
    MetadataResolved {
        /// The root package spec.
        spec: String,
        /// Number of distinct packages to fetch.
        packages: usize,
    },

    /// A dependency branch could not be resolved and was abandoned.
    ///
    /// Sibling branches are unaffected; the resolved set is simply
    /// incomplete below this spec.
    ResolutionFailed {
        /// The spec that failed to resolve.
        spec: String,
        /// Description of the final resolution error.
        error: String,
    },

    /// A package was skipped because a verified local copy exists.
    Skipped {
        /// The package id (`name@version`).
        package: String,
    },

    /// A transfer moved from queued to in-progress.
    TransferStarted {
        /// The package id this transfer belongs to.
        package: String,
        /// Source tarball URL.
        url: String,
        /// Local destination path.
        destination: PathBuf,
    },

    /// Bytes arrived for an in-flight transfer.
    TransferProgress {
        /// The package id this transfer belongs to.
        package: String,
        /// Bytes written so far.
        bytes_completed: u64,
        /// Expected total, 0 when the server did not advertise one.
        bytes_total: u64,
    },

    /// A transfer completed successfully.
    TransferFinished {
        /// The package id this transfer belongs to.
        package: String,
        /// Local destination path.
        destination: PathBuf,
    },

    /// A transfer reached its `Failed` state.
    ///
    /// Emitted by the transfer itself, so the failure is observable on
    /// the bus even when nothing retries it.
    TransferFailed {
        /// The package id this transfer belongs to.
        package: String,
        /// Description of the failure.
        error: String,
    },

    /// A single download attempt failed; a retry may follow.
    AttemptFailed {
        /// The package id.
        package: String,
        /// The attempt number that failed (1-based).
        attempt: usize,
        /// Configured attempt ceiling.
        max_attempts: usize,
        /// Description of the transfer error.
        error: String,
    },

    /// All attempts for a package were exhausted.
    PackageFailed {
        /// The package id.
        package: String,
        /// Description of the terminal error.
        error: String,
    },

    /// The run for a root spec finished (successfully or not).
    Finished {
        /// The root package spec.
        spec: String,
    },
}

/// Cloneable handle for publishing [`Event`]s.
///
/// A disabled bus drops events; a connected bus forwards them over an
/// unbounded channel. Send failures (receiver dropped) are ignored so a
/// disappearing consumer never disturbs an in-flight run.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    sender: Option<mpsc::UnboundedSender<Event>>,
}

impl EventBus {
    /// Creates a connected bus and its receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { sender: Some(tx) }, rx)
    }

    /// Creates a bus that discards every event.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Publishes an event, ignoring a closed receiver.
    pub fn emit(&self, event: Event) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}
