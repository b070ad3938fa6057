//! Runtime for the conversation
//!
//! One task owns the controller. User commands and stream events share a single
//! channel, so every mutation of the log happens in order on that task.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::ConversationRuntime;

use crate::conversation::{ConversationSnapshot, StreamEvent};
use thiserror::Error;
use tokio::sync::{mpsc, watch};

/// Events processed by the runtime
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserMessage { text: String },
    UserCancel,

    // Stream events, tagged with their session
    Stream(StreamEvent),
}

impl From<StreamEvent> for Event {
    fn from(event: StreamEvent) -> Self {
        Event::Stream(event)
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Conversation runtime is not running")]
    Stopped,
}

/// Handle to interact with the running conversation
#[derive(Clone)]
pub struct ConversationHandle {
    event_tx: mpsc::Sender<Event>,
    snapshot_rx: watch::Receiver<ConversationSnapshot>,
}

impl ConversationHandle {
    fn new(
        event_tx: mpsc::Sender<Event>,
        snapshot_rx: watch::Receiver<ConversationSnapshot>,
    ) -> Self {
        Self {
            event_tx,
            snapshot_rx,
        }
    }

    /// Submit a user message; blank text is ignored by the controller
    pub async fn send(&self, text: impl Into<String>) -> Result<(), RuntimeError> {
        self.event_tx
            .send(Event::UserMessage { text: text.into() })
            .await
            .map_err(|_| RuntimeError::Stopped)
    }

    /// Stop the in-flight response, if any
    pub async fn cancel(&self) -> Result<(), RuntimeError> {
        self.event_tx
            .send(Event::UserCancel)
            .await
            .map_err(|_| RuntimeError::Stopped)
    }

    /// Latest published state
    pub fn snapshot(&self) -> ConversationSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.snapshot_rx.clone()
    }
}
