//! Stateful streaming download unit.
//!
//! A [`Transfer`] performs one download attempt for one artifact:
//! it opens the source URL, streams body chunks to the destination file,
//! tracks progress, and walks a small state machine
//! (`Queued -> InProgress -> Completed | Failed`).
//!
//! The terminal outcome is latched in a watch channel, so
//! [`TransferWatch::wait_terminal`] resolves correctly whether it is
//! awaited before or after the transfer finishes - there is no one-shot
//! event to miss.
//!
//! Transfers are single-use: a retry constructs a new `Transfer` for the
//! same destination rather than reusing a finished one.

mod fetcher;
mod state;

pub use fetcher::{ByteStream, FetchResponse, HttpFetcher, TarballFetcher};
pub use state::TransferState;

use std::io;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tracing::debug;

use crate::events::{Event, EventBus};

/// Errors from a single download attempt.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    ClientBuild(String),

    /// The request could not be sent or completed.
    #[error("request for {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("{url} answered with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The body stream broke mid-transfer.
    #[error("error reading response body from {url}: {reason}")]
    Body { url: String, reason: String },

    /// Writing to the destination failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `run` was called on a transfer that already left `Queued`.
    #[error("transfer for {url} already started")]
    AlreadyStarted { url: String },
}

/// One streaming download attempt.
///
/// Identity is `(url, destination)`. State is observable via
/// [`state`](Transfer::state) and [`subscribe`](Transfer::subscribe);
/// lifecycle notifications go out on the [`EventBus`] labelled with the
/// owning package id.
pub struct Transfer {
    url: String,
    destination: PathBuf,
    /// Package id used to label emitted events.
    label: String,
    state_tx: watch::Sender<TransferState>,
    events: EventBus,
}

impl Transfer {
    /// Creates a transfer in the `Queued` state.
    pub fn new(
        url: impl Into<String>,
        destination: impl Into<PathBuf>,
        label: impl Into<String>,
        events: EventBus,
    ) -> Self {
        let (state_tx, _) = watch::channel(TransferState::Queued);
        Self {
            url: url.into(),
            destination: destination.into(),
            label: label.into(),
            state_tx,
            events,
        }
    }

    /// The source URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The destination path.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// The current state (a snapshot; it may change immediately after).
    pub fn state(&self) -> TransferState {
        self.state_tx.borrow().clone()
    }

    /// Returns a handle for awaiting the terminal state.
    ///
    /// Safe to call and await both before and after the transfer
    /// finishes; the terminal state is latched, never re-delivered.
    pub fn subscribe(&self) -> TransferWatch {
        TransferWatch {
            rx: self.state_tx.subscribe(),
        }
    }

    /// Runs the download attempt to its terminal state.
    ///
    /// Transitions `Queued -> InProgress` immediately and emits the
    /// `start` notification; streams body chunks to the destination,
    /// emitting progress per chunk; then latches `Completed` or `Failed`.
    ///
    /// Returns the byte count on success. Calling `run` more than once
    /// fails with [`TransferError::AlreadyStarted`].
    pub async fn run(&self, fetcher: &dyn TarballFetcher) -> Result<u64, TransferError> {
        // Claim the Queued state atomically; a second run finds the
        // machine already moved on.
        let claimed = self.state_tx.send_if_modified(|state| {
            if matches!(state, TransferState::Queued) {
                *state = TransferState::InProgress {
                    bytes_completed: 0,
                    bytes_total: 0,
                };
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(TransferError::AlreadyStarted {
                url: self.url.clone(),
            });
        }

        self.events.emit(Event::TransferStarted {
            package: self.label.clone(),
            url: self.url.clone(),
            destination: self.destination.clone(),
        });
        debug!(url = %self.url, destination = %self.destination.display(), "Transfer started");

        match self.stream_to_destination(fetcher).await {
            Ok(bytes_completed) => {
                self.state_tx
                    .send_replace(TransferState::Completed { bytes_completed });
                self.events.emit(Event::TransferFinished {
                    package: self.label.clone(),
                    destination: self.destination.clone(),
                });
                debug!(url = %self.url, bytes = bytes_completed, "Transfer completed");
                Ok(bytes_completed)
            }
            Err(error) => {
                self.state_tx.send_replace(TransferState::Failed {
                    error: error.to_string(),
                });
                self.events.emit(Event::TransferFailed {
                    package: self.label.clone(),
                    error: error.to_string(),
                });
                debug!(url = %self.url, error = %error, "Transfer failed");
                Err(error)
            }
        }
    }

    /// Opens the source and pipes chunks to the destination file.
    async fn stream_to_destination(
        &self,
        fetcher: &dyn TarballFetcher,
    ) -> Result<u64, TransferError> {
        let FetchResponse {
            bytes_total,
            mut body,
        } = fetcher.fetch(&self.url).await?;

        let mut sink =
            tokio::fs::File::create(&self.destination)
                .await
                .map_err(|e| TransferError::Write {
                    path: self.destination.clone(),
                    source: e,
                })?;

        let mut bytes_completed: u64 = 0;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            sink.write_all(&chunk)
                .await
                .map_err(|e| TransferError::Write {
                    path: self.destination.clone(),
                    source: e,
                })?;

            bytes_completed += chunk.len() as u64;
            self.state_tx.send_replace(TransferState::InProgress {
                bytes_completed,
                bytes_total,
            });
            self.events.emit(Event::TransferProgress {
                package: self.label.clone(),
                bytes_completed,
                bytes_total,
            });
        }

        sink.flush().await.map_err(|e| TransferError::Write {
            path: self.destination.clone(),
            source: e,
        })?;

        Ok(bytes_completed)
    }
}

impl std::fmt::Debug for Transfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transfer")
            .field("url", &self.url)
            .field("destination", &self.destination)
            .field("state", &self.state())
            .finish()
    }
}

/// Awaitable view of a transfer's terminal state.
pub struct TransferWatch {
    rx: watch::Receiver<TransferState>,
}

impl TransferWatch {
    /// Waits until the transfer reaches `Completed` or `Failed` and
    /// returns that state.
    ///
    /// Resolves immediately when the terminal state was already reached.
    pub async fn wait_terminal(&mut self) -> TransferState {
        loop {
            let current = self.rx.borrow().clone();
            if current.is_terminal() {
                return current;
            }
            // Sender dropped without a terminal state: report what we saw.
            if self.rx.changed().await.is_err() {
                return self.rx.borrow().clone();
            }
        }
    }
}
