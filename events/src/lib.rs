//! # Stillwater Event Stream Client
//!
//! Client for the resort API's server-push event stream with
//! reconnect-and-backoff semantics. Events arrive as newline-delimited
//! JSON and are handed to a caller-supplied handler in arrival order;
//! the connection is kept alive indefinitely until the caller closes it.
//!
//! ## Example
//!
//! ```no_run
//! use stillwater_events::{EventStreamClient, StreamConfig};
//! use stillwater_events::transport::HttpTransport;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = EventStreamClient::new(
//!         Arc::new(HttpTransport::new()),
//!         StreamConfig::new("https://api.resort.example"),
//!     );
//!
//!     // Returns immediately; the stream runs on a background worker
//!     client.connect(|event| {
//!         println!("event: {event}");
//!     }).await;
//!
//!     // ... later: terminal teardown
//!     client.disconnect().await;
//! }
//! ```
//!
//! ## Behavior
//!
//! - Connection failures, broken streams, and server-side closes all take
//!   the same reconnect path
//! - Reconnect delays start at 1000ms, multiply by 1.5 per disconnection,
//!   and cap at 30s; the escalation is never reset
//! - Malformed event payloads are dropped silently without affecting the
//!   connection

pub mod backoff;
pub mod client;
pub mod error;
pub mod mocks;
pub mod transport;

// Re-export main types for convenience
pub use backoff::BackoffPolicy;
pub use client::{ConnectionState, EVENTS_PATH, EventStreamClient, StreamConfig};
pub use error::StreamError;
pub use transport::{EventByteStream, EventTransport, HttpTransport};
