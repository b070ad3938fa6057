//! Events delivered by a streaming session

use crate::llm::{Citation, LlmError};
use std::fmt;

/// Identity of one request/stream exchange.
///
/// Allocated by the controller and never reused, so an event from a
/// superseded session can always be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub(super) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Something that happened on a session's stream
#[derive(Debug, Clone)]
pub struct StreamEvent {
    pub session: SessionId,
    pub kind: StreamEventKind,
}

impl StreamEvent {
    pub fn fragment(session: SessionId, text: impl Into<String>) -> Self {
        Self {
            session,
            kind: StreamEventKind::Fragment(text.into()),
        }
    }

    pub fn citations(session: SessionId, citations: Vec<Citation>) -> Self {
        Self {
            session,
            kind: StreamEventKind::Citations(citations),
        }
    }

    pub fn terminated(session: SessionId, outcome: StreamOutcome) -> Self {
        Self {
            session,
            kind: StreamEventKind::Terminated(outcome),
        }
    }
}

#[derive(Debug, Clone)]
pub enum StreamEventKind {
    /// Incremental text, appended as-is
    Fragment(String),
    /// Grounding references reported by one backend event
    Citations(Vec<Citation>),
    /// Final event of every session
    Terminated(StreamOutcome),
}

/// How a session ended
#[derive(Debug, Clone)]
pub enum StreamOutcome {
    Completed,
    /// Stopped because the caller signalled cancellation
    Cancelled,
    /// Transport or backend failure not caused by cancellation
    Failed(LlmError),
}

impl StreamOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamOutcome::Completed => "completed",
            StreamOutcome::Cancelled => "cancelled",
            StreamOutcome::Failed(_) => "failed",
        }
    }
}
