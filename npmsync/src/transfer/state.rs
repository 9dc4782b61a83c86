//! Transfer state machine.

use std::fmt;

/// State of a single download attempt.
///
/// The only legal path is `Queued -> InProgress -> {Completed | Failed}`;
/// there are no transitions out of a terminal state. Each variant carries
/// the data valid in that state, so there are no nullable fields to
/// interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferState {
    /// Created, not yet started.
    Queued,

    /// Bytes are flowing.
    InProgress {
        /// Bytes written to the destination so far.
        bytes_completed: u64,
        /// Expected total, 0 when the server did not advertise one.
        /// "Unknown total" is a valid, permanent condition.
        bytes_total: u64,
    },

    /// All bytes received and flushed.
    Completed {
        /// Final byte count.
        bytes_completed: u64,
    },

    /// The attempt failed; a retry uses a fresh [`Transfer`](super::Transfer).
    Failed {
        /// Description of the transport or I/O error.
        error: String,
    },
}

impl TransferState {
    /// Returns true for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }

    /// Returns true if the transfer finished successfully.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Returns true if the transfer failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::InProgress {
                bytes_completed,
                bytes_total,
            } => write!(f, "in progress ({}/{} bytes)", bytes_completed, bytes_total),
            Self::Completed { bytes_completed } => {
                write!(f, "completed ({} bytes)", bytes_completed)
            }
            Self::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}
