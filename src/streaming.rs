//! Streaming client: drives one session against a chat backend
//!
//! A session moves `Opening -> Streaming -> {Completed | Cancelled | Failed}`.
//! Every event it produces is tagged with its [`SessionId`] and sent to the
//! owner's event channel; the last one is always a `Terminated` event.
//!
//! Cancellation is cooperative: the token is checked before each event is
//! processed and raced against the wait for the next one. Dropping the chunk
//! stream on exit closes the underlying connection.

use crate::conversation::{Message, OpenSession, Role, SessionId, StreamEvent, StreamOutcome};
use crate::llm::{ChatBackend, ChunkStream, LlmError, StreamChunk, StreamRequest, Turn};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Request options applied to every session
#[derive(Debug, Clone)]
pub struct StreamingConfig {
    pub system_instruction: Option<String>,
    pub web_grounding: bool,
    pub minimal_latency: bool,
    /// Fail the session if no event arrives for this long
    pub idle_timeout: Option<Duration>,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            system_instruction: None,
            web_grounding: true,
            minimal_latency: true,
            idle_timeout: None,
        }
    }
}

/// Lifecycle of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Opening,
    Streaming,
}

pub struct StreamingClient {
    backend: Arc<dyn ChatBackend>,
    config: StreamingConfig,
}

impl StreamingClient {
    pub fn new(backend: Arc<dyn ChatBackend>, config: StreamingConfig) -> Self {
        Self { backend, config }
    }

    /// Translate history and utterance into a backend request
    pub fn build_request(&self, history: &[Message], utterance: &str) -> StreamRequest {
        let history = history
            .iter()
            .map(|m| match m.role {
                Role::User => Turn::user(m.content.clone()),
                Role::Assistant => Turn::model(m.content.clone()),
            })
            .collect();

        StreamRequest {
            system_instruction: self.config.system_instruction.clone(),
            history,
            utterance: utterance.to_string(),
            web_grounding: self.config.web_grounding,
            minimal_latency: self.config.minimal_latency,
        }
    }

    /// Start a session in the background.
    ///
    /// Results arrive on `events`; the returned handle is only useful for
    /// callers that want to wait for the session to finish.
    pub fn open<E>(&self, open: OpenSession, events: mpsc::Sender<E>) -> JoinHandle<StreamOutcome>
    where
        E: From<StreamEvent> + Send + 'static,
    {
        let request = self.build_request(&open.history, &open.utterance);
        let backend = Arc::clone(&self.backend);
        let idle_timeout = self.config.idle_timeout;

        tokio::spawn(async move {
            let session = open.session;
            let outcome = consume(
                backend.as_ref(),
                &request,
                session,
                &open.cancel,
                &events,
                idle_timeout,
            )
            .await;

            tracing::debug!(session = %session, outcome = outcome.as_str(), "Session terminated");
            // Receiver gone means the owner shut down; nothing left to tell
            let _ = events
                .send(StreamEvent::terminated(session, outcome.clone()).into())
                .await;
            outcome
        })
    }
}

async fn consume<E>(
    backend: &dyn ChatBackend,
    request: &StreamRequest,
    session: SessionId,
    cancel: &CancellationToken,
    events: &mpsc::Sender<E>,
    idle_timeout: Option<Duration>,
) -> StreamOutcome
where
    E: From<StreamEvent> + Send + 'static,
{
    let opened = tokio::select! {
        biased;
        () = cancel.cancelled() => return StreamOutcome::Cancelled,
        opened = backend.open_stream(request) => opened,
    };

    let mut chunks = match opened {
        Ok(chunks) => chunks,
        Err(e) => return failure(session, SessionPhase::Opening, e, cancel),
    };

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return StreamOutcome::Cancelled,
            next = next_chunk(&mut chunks, idle_timeout) => next,
        };

        if cancel.is_cancelled() {
            return StreamOutcome::Cancelled;
        }

        let chunk = match next {
            None => return StreamOutcome::Completed,
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => return failure(session, SessionPhase::Streaming, e, cancel),
        };

        if let Some(text) = chunk.text {
            if events.send(StreamEvent::fragment(session, text).into()).await.is_err() {
                return StreamOutcome::Cancelled;
            }
        }

        if !chunk.citations.is_empty()
            && events
                .send(StreamEvent::citations(session, chunk.citations).into())
                .await
                .is_err()
        {
            return StreamOutcome::Cancelled;
        }
    }
}

async fn next_chunk(
    chunks: &mut ChunkStream,
    idle_timeout: Option<Duration>,
) -> Option<Result<StreamChunk, LlmError>> {
    let Some(limit) = idle_timeout else {
        return chunks.next().await;
    };
    match tokio::time::timeout(limit, chunks.next()).await {
        Ok(next) => next,
        Err(_) => Some(Err(LlmError::network(format!(
            "No stream event for {}ms",
            limit.as_millis()
        )))),
    }
}

/// Errors observed after cancellation are part of the cancellation
fn failure(
    session: SessionId,
    phase: SessionPhase,
    error: LlmError,
    cancel: &CancellationToken,
) -> StreamOutcome {
    if cancel.is_cancelled() {
        tracing::debug!(session = %session, error = %error, "Ignoring error after cancellation");
        return StreamOutcome::Cancelled;
    }
    tracing::error!(
        session = %session,
        phase = ?phase,
        kind = error.kind.as_str(),
        error = %error,
        "Streaming session failed"
    );
    StreamOutcome::Failed(error)
}
