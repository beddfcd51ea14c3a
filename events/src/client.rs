//! Event stream client with reconnect backoff.
//!
//! The client owns one long-lived server-push connection and a worker task
//! that keeps it alive: on any failure (refused connection, broken stream,
//! or server-side close) it waits out a backoff delay and reconnects.
//! Inbound data is newline-delimited JSON; each decoded message is handed
//! to the caller's handler in arrival order, and malformed lines are
//! dropped without touching the connection.
//!
//! The backoff delay escalates with every disconnection for the lifetime
//! of the client. It is not reset by a successful reconnect.

use crate::backoff::BackoffPolicy;
use crate::error::StreamError;
use crate::transport::{EventByteStream, EventTransport};
use async_stream::stream;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

/// Fixed path of the event stream endpoint
pub const EVENTS_PATH: &str = "/api/events/stream";

/// Connection lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No live connection; a reconnect is pending unless closed
    Disconnected,
    /// Connection attempt in flight
    Connecting,
    /// Live connection delivering events
    Connected,
    /// Terminal state entered by `disconnect`
    Closed,
}

/// Event stream configuration
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Base URL of the API host, without the stream path
    pub base_url: String,
    /// Reconnect backoff policy
    pub backoff: BackoffPolicy,
}

impl StreamConfig {
    /// Creates a configuration with the default backoff policy
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            backoff: BackoffPolicy::default(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}{EVENTS_PATH}", self.base_url)
    }
}

/// Client for the resort's server-push event stream
///
/// `connect` registers a handler and returns immediately; all stream work
/// happens on a background worker. `disconnect` is terminal: it cancels
/// any pending reconnect, closes the live connection, and the client
/// cannot be reconnected afterwards.
pub struct EventStreamClient {
    transport: Arc<dyn EventTransport>,
    config: StreamConfig,
    state: Arc<watch::Sender<ConnectionState>>,
    shutdown: watch::Sender<bool>,
    worker: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl EventStreamClient {
    /// Creates a client for `config`'s endpoint over the given transport
    #[must_use]
    pub fn new(transport: Arc<dyn EventTransport>, config: StreamConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (shutdown, _) = watch::channel(false);

        Self {
            transport,
            config,
            state: Arc::new(state),
            shutdown,
            worker: Mutex::new(None),
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Subscribe to lifecycle state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Starts the stream worker, invoking `handler` once per decoded event
    ///
    /// Returns as soon as the worker is spawned; it never blocks on the
    /// connection itself. Calling `connect` while a worker is already
    /// running, or after `disconnect`, is ignored.
    pub async fn connect<F>(&self, handler: F)
    where
        F: FnMut(serde_json::Value) + Send + 'static,
    {
        if *self.shutdown.borrow() {
            tracing::warn!("connect on a closed event stream client ignored");
            return;
        }

        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            tracing::warn!("event stream worker already running");
            return;
        }

        *worker = Some(tokio::spawn(run_loop(
            Arc::clone(&self.transport),
            self.config.endpoint(),
            self.config.backoff.clone(),
            Arc::clone(&self.state),
            self.shutdown.subscribe(),
            handler,
        )));
    }

    /// Tears the client down
    ///
    /// Cancels a pending reconnect, closes the live connection, and waits
    /// for the worker to exit. Idempotent.
    pub async fn disconnect(&self) {
        if self.shutdown.send_replace(true) {
            return;
        }

        if let Some(worker) = self.worker.lock().await.take() {
            let _ = worker.await;
        }

        self.state.send_replace(ConnectionState::Closed);
        tracing::info!("event stream closed");
    }
}

impl std::fmt::Debug for EventStreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStreamClient")
            .field("endpoint", &self.config.endpoint())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Connection loop: connect, drain events, back off, repeat until shut down
async fn run_loop<F>(
    transport: Arc<dyn EventTransport>,
    endpoint: String,
    backoff: BackoffPolicy,
    state: Arc<watch::Sender<ConnectionState>>,
    mut shutdown: watch::Receiver<bool>,
    mut handler: F,
) where
    F: FnMut(serde_json::Value) + Send + 'static,
{
    let mut attempt = 0usize;

    'reconnect: loop {
        if *shutdown.borrow() {
            break;
        }
        state.send_replace(ConnectionState::Connecting);

        match transport.open(&endpoint).await {
            Ok(bytes) => {
                state.send_replace(ConnectionState::Connected);
                tracing::info!(endpoint = %endpoint, "event stream connected");

                let mut events = decode_lines(bytes);
                loop {
                    if *shutdown.borrow() {
                        break 'reconnect;
                    }

                    tokio::select! {
                        _ = shutdown.changed() => break 'reconnect,
                        next = events.next() => match next {
                            Some(Ok(event)) => handler(event),
                            Some(Err(error)) => {
                                tracing::warn!(%error, "event stream broke");
                                break;
                            }
                            None => {
                                tracing::info!("event stream closed by server");
                                break;
                            }
                        },
                    }
                }
            }
            Err(error) => {
                tracing::warn!(%error, attempt, "event stream connection failed");
            }
        }

        if *shutdown.borrow() {
            break;
        }
        state.send_replace(ConnectionState::Disconnected);

        // The counter keeps escalating across successful reconnects
        let delay = backoff.delay_for_attempt(attempt);
        attempt += 1;
        tracing::debug!(delay_ms = delay.as_millis(), attempt, "reconnect scheduled");

        tokio::select! {
            _ = shutdown.changed() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }
}

/// Splits a byte stream into newline-delimited JSON messages
///
/// Lines are decoded as they complete; a message may span any number of
/// transport chunks. Blank lines and lines that fail to parse are dropped.
/// Transport errors end the stream after being surfaced once.
fn decode_lines(
    bytes: EventByteStream,
) -> Pin<Box<dyn Stream<Item = Result<serde_json::Value, StreamError>> + Send>> {
    Box::pin(stream! {
        let mut buffer = String::new();

        for await chunk in bytes {
            match chunk {
                Ok(bytes) => {
                    buffer.push_str(&String::from_utf8_lossy(&bytes));

                    while let Some(pos) = buffer.find('\n') {
                        let line = buffer[..pos].trim().to_string();
                        buffer.drain(..=pos);

                        if line.is_empty() {
                            continue;
                        }

                        match serde_json::from_str::<serde_json::Value>(&line) {
                            Ok(value) => yield Ok(value),
                            Err(error) => {
                                tracing::debug!(%error, "dropping malformed event");
                            }
                        }
                    }
                }
                Err(e) => {
                    yield Err(e);
                    break;
                }
            }
        }
    })
}
