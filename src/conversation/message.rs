//! Conversation log types

use crate::llm::Citation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque message identifier, unique within a conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Whether a message is part of the exchange or a seeded greeting.
///
/// Greetings are shown to the user but never sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Greeting,
    Turn,
}

/// A single entry of the conversation log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub kind: MessageKind,
    pub content: String,
    pub is_streaming: bool,
    pub citations: Vec<Citation>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub(super) fn greeting(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Assistant,
            kind: MessageKind::Greeting,
            content: text.into(),
            is_streaming: false,
            citations: vec![],
            created_at: Utc::now(),
        }
    }

    pub(super) fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            kind: MessageKind::Turn,
            content: text.into(),
            is_streaming: false,
            citations: vec![],
            created_at: Utc::now(),
        }
    }

    pub(super) fn pending_assistant() -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Assistant,
            kind: MessageKind::Turn,
            content: String::new(),
            is_streaming: true,
            citations: vec![],
            created_at: Utc::now(),
        }
    }

    /// Append a streamed fragment. No-op once the message is finalized.
    pub(super) fn append_fragment(&mut self, fragment: &str) {
        if self.is_streaming {
            self.content.push_str(fragment);
        }
    }

    /// Merge a citation batch, keeping the first-seen entry per uri.
    ///
    /// Returns how many citations were added.
    pub(super) fn merge_citations(&mut self, batch: Vec<Citation>) -> usize {
        if !self.is_streaming {
            return 0;
        }
        let before = self.citations.len();
        for citation in batch {
            if !self.citations.iter().any(|c| c.uri == citation.uri) {
                self.citations.push(citation);
            }
        }
        self.citations.len() - before
    }

    /// End streaming, keeping whatever content accumulated
    pub(super) fn finish(&mut self) {
        self.is_streaming = false;
    }

    /// End streaming, replacing partial content with a failure notice
    pub(super) fn fail(&mut self, notice: &str) {
        if self.is_streaming {
            self.content = notice.to_string();
            self.is_streaming = false;
        }
    }
}

/// Append-only, chronologically ordered message log
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub(super) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(super) fn get_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        // The target is almost always the last entry
        self.messages.iter_mut().rev().find(|m| &m.id == id)
    }

    /// Messages that form the backend history: every turn, no greetings
    pub(super) fn history(&self) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|m| m.kind == MessageKind::Turn)
            .cloned()
            .collect()
    }
}

/// Read-only view handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSnapshot {
    pub messages: Vec<Message>,
    pub is_loading: bool,
}
