//! Push Session Directory
//!
//! Maps an id0 to the connection that last identified itself with it, so
//! status changes can be pushed to the device. One connection may own
//! several id0s; an id0 belongs to at most one connection.

use crate::domain::value_objects::Id0;
use dashmap::DashMap;
use futures::{Sink, SinkExt};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Outbound frame on a push channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Close,
}

/// Push channel failure
#[derive(Debug, thiserror::Error)]
#[error("Push channel closed: {0}")]
pub struct ChannelError(pub String);

/// Write half of a push channel
pub type FrameSink = Pin<Box<dyn Sink<Frame, Error = ChannelError> + Send>>;

/// Shared handle to a connection's write half
pub type SharedSink = Arc<Mutex<FrameSink>>;

/// Wrap a sink for use in the directory
pub fn shared_sink<S>(sink: S) -> SharedSink
where
    S: Sink<Frame, Error = ChannelError> + Send + 'static,
{
    Arc::new(Mutex::new(Box::pin(sink)))
}

#[derive(Clone)]
struct SessionHandle {
    connection_id: u64,
    sink: SharedSink,
}

/// Session directory
#[derive(Default)]
pub struct SessionDirectory {
    sessions: DashMap<Id0, SessionHandle>,
    connection_counter: AtomicU64,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier for a new connection
    pub fn next_connection_id(&self) -> u64 {
        self.connection_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Bind `id0` to a connection
    ///
    /// A different connection previously bound to the id0 is sent a close
    /// frame.
    pub async fn register(&self, id0: &Id0, connection_id: u64, sink: SharedSink) {
        let previous = self.sessions.insert(
            id0.clone(),
            SessionHandle {
                connection_id,
                sink,
            },
        );

        if let Some(previous) = previous {
            if previous.connection_id != connection_id {
                tracing::debug!(
                    id0 = %id0,
                    old_connection = previous.connection_id,
                    new_connection = connection_id,
                    "Replacing push session"
                );
                let mut sink = previous.sink.lock().await;
                if let Err(e) = sink.send(Frame::Close).await {
                    tracing::debug!(error = %e, "Closing replaced session failed");
                }
            }
        }
    }

    pub fn contains(&self, id0: &Id0) -> bool {
        self.sessions.contains_key(id0)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Push a text frame to the session of `id0`
    ///
    /// Returns false if there is no session or the send failed. A failed
    /// session is dropped.
    pub async fn send(&self, id0: &Id0, text: String) -> bool {
        let Some(handle) = self.sessions.get(id0).map(|entry| entry.clone()) else {
            return false;
        };

        let result = handle.sink.lock().await.send(Frame::Text(text)).await;
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(id0 = %id0, error = %e, "Push failed, dropping session");
                self.sessions
                    .remove_if(id0, |_, current| current.connection_id == handle.connection_id);
                false
            }
        }
    }

    /// Drop every session owned by a connection
    pub fn remove_connection(&self, connection_id: u64) {
        self.sessions
            .retain(|_, handle| handle.connection_id != connection_id);
        tracing::debug!(connection_id, "Removed sessions for connection");
    }
}
