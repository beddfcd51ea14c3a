//! Connection transport for the event stream.
//!
//! A transport turns an endpoint URL into a raw byte stream and nothing
//! more. Reconnect policy, decoding, and lifecycle state all live in the
//! client, so tests can drive the client with a scripted transport.

use crate::error::StreamError;
use futures::stream::{Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;

/// Raw bytes arriving over a server-push connection
///
/// Chunk boundaries carry no meaning; a decoded message may span chunks.
pub type EventByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, StreamError>> + Send>>;

/// Opens server-push connections
pub trait EventTransport: Send + Sync {
    /// Open a connection to `url`, resolving to the raw byte stream
    ///
    /// Establishment failures and refused statuses are both reported as
    /// errors here; failures after the stream is handed over surface as
    /// `Err` items on the stream itself.
    fn open(
        &self,
        url: &str,
    ) -> Pin<Box<dyn Future<Output = Result<EventByteStream, StreamError>> + Send>>;
}

/// HTTP transport reading a long-lived chunked response body
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with a fresh HTTP client
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl EventTransport for HttpTransport {
    fn open(
        &self,
        url: &str,
    ) -> Pin<Box<dyn Future<Output = Result<EventByteStream, StreamError>> + Send>> {
        let client = self.client.clone();
        let url = url.to_string();

        Box::pin(async move {
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| StreamError::Connect(e.to_string()))?;

            if !response.status().is_success() {
                return Err(StreamError::Status(response.status().as_u16()));
            }

            let bytes = response.bytes_stream().map(|chunk| match chunk {
                Ok(bytes) => Ok(bytes.to_vec()),
                Err(e) => Err(StreamError::Transport(e.to_string())),
            });

            Ok(Box::pin(bytes) as EventByteStream)
        })
    }
}
