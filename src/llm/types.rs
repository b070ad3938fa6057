//! Common types for streaming LLM interactions

use super::LlmError;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Streaming chat request
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub system_instruction: Option<String>,
    /// Prior turns, oldest first
    pub history: Vec<Turn>,
    /// The new user utterance for this request
    pub utterance: String,
    /// Let the backend retrieve web sources and report them as grounding
    pub web_grounding: bool,
    /// Disable extended internal reasoning
    pub minimal_latency: bool,
}

/// One prior turn of the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

/// Turn author as the backend sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }
}

/// A web source the backend attributed generated content to.
///
/// Identity is the `uri`; two citations with the same uri are the same source
/// whatever their titles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub uri: String,
    #[serde(default)]
    pub title: String,
}

impl Citation {
    pub fn new(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: title.into(),
        }
    }
}

/// One event of a streamed response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamChunk {
    /// Text carried by this event, if any
    pub text: Option<String>,
    /// Grounding references carried by this event (only those with a usable uri)
    pub citations: Vec<Citation>,
}

#[cfg(test)]
impl StreamChunk {
    pub fn text(s: impl Into<String>) -> Self {
        Self {
            text: Some(s.into()),
            citations: vec![],
        }
    }

    pub fn citations(citations: Vec<Citation>) -> Self {
        Self {
            text: None,
            citations,
        }
    }
}

/// Incremental response events; ends when the backend closes the stream
pub type ChunkStream = BoxStream<'static, Result<StreamChunk, LlmError>>;
