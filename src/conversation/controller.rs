//! Streaming conversation controller
//!
//! Owns the message log and the single active session. All mutation goes
//! through [`ConversationController::send`], [`ConversationController::cancel`]
//! and [`ConversationController::apply`]; the caller serializes those calls.
//!
//! The controller performs no I/O. `send` hands back an [`OpenSession`] that the
//! runtime passes to the streaming client, and events from that client come back
//! through `apply`, tagged with the session they belong to.

use super::event::{SessionId, StreamEvent, StreamEventKind, StreamOutcome};
use super::message::{ConversationLog, ConversationSnapshot, Message, MessageId};
use tokio_util::sync::CancellationToken;

/// The in-flight request/stream exchange
#[derive(Debug)]
struct StreamSession {
    id: SessionId,
    target: MessageId,
    cancel: CancellationToken,
}

/// Request to open a streaming session, produced by `send`
#[derive(Debug, Clone)]
pub struct OpenSession {
    pub session: SessionId,
    /// Everything before this turn, greetings excluded
    pub history: Vec<Message>,
    pub utterance: String,
    pub cancel: CancellationToken,
}

/// What `apply` did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Applied,
    /// The event belonged to a superseded or cancelled session and was dropped
    Stale,
}

pub struct ConversationController {
    log: ConversationLog,
    session: Option<StreamSession>,
    next_session: u64,
    failure_notice: String,
}

impl ConversationController {
    pub fn new(failure_notice: impl Into<String>) -> Self {
        Self {
            log: ConversationLog::default(),
            session: None,
            next_session: 1,
            failure_notice: failure_notice.into(),
        }
    }

    /// Seed the log with a greeting that is shown but never sent to the backend
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.log.push(Message::greeting(greeting));
        self
    }

    #[cfg(test)]
    pub fn messages(&self) -> &[Message] {
        self.log.messages()
    }

    /// True exactly while a session is active
    pub fn is_loading(&self) -> bool {
        self.session.is_some()
    }

    #[cfg(test)]
    pub fn active_session(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            messages: self.log.messages().to_vec(),
            is_loading: self.is_loading(),
        }
    }

    /// Start a new turn.
    ///
    /// Whitespace-only input is ignored. An active session is superseded before
    /// the new pair is appended, so nothing from it can reach the new turn.
    pub fn send(&mut self, text: &str) -> Option<OpenSession> {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!("Ignoring empty message");
            return None;
        }

        if let Some(previous) = self.end_session() {
            tracing::info!(session = %previous, "Superseding active session");
        }

        let history = self.log.history();

        self.log.push(Message::user(text));
        let assistant = Message::pending_assistant();
        let target = assistant.id.clone();
        self.log.push(assistant);

        let id = SessionId::new(self.next_session);
        self.next_session += 1;
        let cancel = CancellationToken::new();

        tracing::info!(
            session = %id,
            target = %target,
            history_len = history.len(),
            "Opening session"
        );

        self.session = Some(StreamSession {
            id,
            target,
            cancel: cancel.clone(),
        });

        Some(OpenSession {
            session: id,
            history,
            utterance: text.to_string(),
            cancel,
        })
    }

    /// Stop the active session, keeping whatever content already arrived.
    ///
    /// Returns false when there was nothing to cancel.
    pub fn cancel(&mut self) -> bool {
        match self.end_session() {
            Some(id) => {
                tracing::info!(session = %id, "Session cancelled");
                true
            }
            None => false,
        }
    }

    /// Apply an event from a streaming session
    pub fn apply(&mut self, event: StreamEvent) -> Disposition {
        let Some(session) = self.session.as_ref().filter(|s| s.id == event.session) else {
            tracing::debug!(session = %event.session, "Dropping event from stale session");
            return Disposition::Stale;
        };
        let target = session.target.clone();

        let Some(message) = self.log.get_mut(&target) else {
            tracing::error!(session = %event.session, target = %target, "Session target missing from log");
            self.session = None;
            return Disposition::Stale;
        };

        match event.kind {
            StreamEventKind::Fragment(text) => {
                message.append_fragment(&text);
            }
            StreamEventKind::Citations(batch) => {
                let added = message.merge_citations(batch);
                tracing::debug!(session = %event.session, added, "Citations merged");
            }
            StreamEventKind::Terminated(outcome) => {
                match &outcome {
                    StreamOutcome::Completed | StreamOutcome::Cancelled => message.finish(),
                    StreamOutcome::Failed(error) => {
                        tracing::warn!(
                            session = %event.session,
                            kind = error.kind.as_str(),
                            "Session failed, showing failure notice"
                        );
                        message.fail(&self.failure_notice);
                    }
                }
                tracing::info!(session = %event.session, outcome = outcome.as_str(), "Session ended");
                self.session = None;
            }
        }

        Disposition::Applied
    }

    /// Signal cancellation, finalize the target message and drop the session
    fn end_session(&mut self) -> Option<SessionId> {
        let session = self.session.take()?;
        session.cancel.cancel();
        if let Some(message) = self.log.get_mut(&session.target) {
            message.finish();
        }
        Some(session.id)
    }
}
