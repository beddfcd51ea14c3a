//! Error types for the event stream client

use thiserror::Error;

/// Errors raised while opening or reading a server-push connection
///
/// All variants feed the same reconnect path; none of them is terminal for
/// the client.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Connection could not be established
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Endpoint refused the stream with a non-success status
    #[error("Endpoint returned status {0}")]
    Status(u16),

    /// The live connection broke mid-stream
    #[error("Stream failed: {0}")]
    Transport(String),
}
