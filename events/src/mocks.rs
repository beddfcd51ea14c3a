//! Test doubles for the event stream transport.
//!
//! Shared by unit and integration tests, so they live in the crate proper
//! rather than under `#[cfg(test)]`.

use crate::error::StreamError;
use crate::transport::{EventByteStream, EventTransport};
use futures::stream::StreamExt;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One scripted connection outcome
#[derive(Debug, Clone)]
pub enum Script {
    /// Refuse the connection attempt
    Refuse,
    /// Serve these chunks, then end the stream as a server-side close
    Serve(Vec<Vec<u8>>),
    /// Serve these chunks, then break the stream with a transport error
    Fail(Vec<Vec<u8>>),
    /// Serve these chunks, then keep the connection open indefinitely
    Hold(Vec<Vec<u8>>),
}

/// Transport that plays back a scripted sequence of connections
///
/// Each `open` consumes the next entry; once the script runs out every
/// further attempt is refused.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    opens: AtomicUsize,
}

impl ScriptedTransport {
    /// Creates a transport playing back `scripts` in order
    pub fn new(scripts: impl IntoIterator<Item = Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            opens: AtomicUsize::new(0),
        }
    }

    /// Number of connection attempts made so far
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl EventTransport for ScriptedTransport {
    fn open(
        &self,
        _url: &str,
    ) -> Pin<Box<dyn Future<Output = Result<EventByteStream, StreamError>> + Send>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.lock().ok().and_then(|mut s| s.pop_front());

        Box::pin(async move {
            match script {
                Some(Script::Serve(chunks)) => {
                    let items: Vec<Result<Vec<u8>, StreamError>> =
                        chunks.into_iter().map(Ok).collect();
                    Ok(Box::pin(futures::stream::iter(items)) as EventByteStream)
                }
                Some(Script::Fail(chunks)) => {
                    let items: Vec<Result<Vec<u8>, StreamError>> = chunks
                        .into_iter()
                        .map(Ok)
                        .chain(std::iter::once(Err(StreamError::Transport(
                            "scripted stream failure".to_string(),
                        ))))
                        .collect();
                    Ok(Box::pin(futures::stream::iter(items)) as EventByteStream)
                }
                Some(Script::Hold(chunks)) => {
                    let items: Vec<Result<Vec<u8>, StreamError>> =
                        chunks.into_iter().map(Ok).collect();
                    let stream = futures::stream::iter(items).chain(futures::stream::pending());
                    Ok(Box::pin(stream) as EventByteStream)
                }
                Some(Script::Refuse) | None => {
                    Err(StreamError::Connect("scripted refusal".to_string()))
                }
            }
        })
    }
}
