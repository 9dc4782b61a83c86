//! Tarball byte source abstraction.
//!
//! The transfer unit only needs "open this URL, get an expected size and
//! a stream of chunks". Putting that behind a trait keeps the state
//! machine testable with scripted streams instead of a live server.

use std::pin::Pin;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::Stream;
use futures_util::TryStreamExt;

use super::TransferError;

/// A stream of tarball body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransferError>> + Send>>;

/// An opened tarball response: advertised size plus body stream.
pub struct FetchResponse {
    /// Expected total bytes, 0 when the server did not say.
    pub bytes_total: u64,
    /// The response body.
    pub body: ByteStream,
}

/// Opens streamable artifact responses.
pub trait TarballFetcher: Send + Sync {
    /// Opens a request for `url` and returns the streaming body.
    ///
    /// Non-success HTTP statuses are errors; a missing content length
    /// is not.
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchResponse, TransferError>>;
}

/// Streaming HTTP fetcher backed by reqwest.
///
/// No request timeout is configured; a stalled transfer occupies its
/// concurrency slot until the connection dies. This is a documented gap,
/// not an accident.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with default transport settings.
    pub fn new() -> Result<Self, TransferError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransferError::ClientBuild(e.to_string()))?;
        Ok(Self { client })
    }
}

impl TarballFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchResponse, TransferError>> {
        Box::pin(async move {
            let response =
                self.client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| TransferError::Request {
                        url: url.to_string(),
                        reason: e.to_string(),
                    })?;

            let status = response.status();
            if !status.is_success() {
                return Err(TransferError::HttpStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            // Missing/unparseable content length means "unknown total".
            let bytes_total = response.content_length().unwrap_or(0);

            let owned_url = url.to_string();
            let body: ByteStream = Box::pin(response.bytes_stream().map_err(move |e| {
                TransferError::Body {
                    url: owned_url.clone(),
                    reason: e.to_string(),
                }
            }));

            Ok(FetchResponse { bytes_total, body })
        })
    }
}
