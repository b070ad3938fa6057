//! Mock backends for testing
//!
//! These mocks let the streaming client and runtime run without network I/O.

use crate::llm::{ChatBackend, ChunkStream, LlmError, StreamChunk, StreamRequest};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::{mpsc, Notify};
use tokio_stream::wrappers::UnboundedReceiverStream;

// ============================================================================
// Scripted Backend
// ============================================================================

type Script = Result<Vec<Result<StreamChunk, LlmError>>, LlmError>;

/// Backend that replays queued responses, one per request
pub struct ScriptedBackend {
    scripts: Mutex<VecDeque<Script>>,
    /// Record of all requests made
    requests: Mutex<Vec<StreamRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a stream that yields these items and then ends
    pub fn queue_stream(&self, items: Vec<Result<StreamChunk, LlmError>>) {
        self.scripts.lock().unwrap().push_back(Ok(items));
    }

    /// Queue a request that fails before streaming starts
    pub fn queue_error(&self, error: LlmError) {
        self.scripts.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<StreamRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn open_stream(&self, request: &StreamRequest) -> Result<ChunkStream, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))?;
        Ok(futures::stream::iter(script).boxed())
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// Manual Backend (for cancellation and supersession testing)
// ============================================================================

/// Backend whose streams are fed by the test, one [`ManualStream`] per request
pub struct ManualBackend {
    opened_tx: mpsc::UnboundedSender<ManualStream>,
    opened_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<ManualStream>>,
    /// Notified on every request, before the stream is handed out
    open_attempted: Notify,
    /// Never finish opening
    hold: bool,
}

impl ManualBackend {
    pub fn new() -> Self {
        let (opened_tx, opened_rx) = mpsc::unbounded_channel();
        Self {
            opened_tx,
            opened_rx: tokio::sync::Mutex::new(opened_rx),
            open_attempted: Notify::new(),
            hold: false,
        }
    }

    /// Make every request hang in the opening phase
    pub fn hold_open(mut self) -> Self {
        self.hold = true;
        self
    }

    /// Wait until a request reaches the backend
    pub async fn wait_for_open_attempt(&self) {
        self.open_attempted.notified().await;
    }

    /// Wait for the next opened stream
    pub async fn next_stream(&self) -> ManualStream {
        self.opened_rx
            .lock()
            .await
            .recv()
            .await
            .expect("backend dropped")
    }
}

#[async_trait]
impl ChatBackend for ManualBackend {
    async fn open_stream(&self, request: &StreamRequest) -> Result<ChunkStream, LlmError> {
        self.open_attempted.notify_one();
        if self.hold {
            futures::future::pending::<()>().await;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = self.opened_tx.send(ManualStream {
            request: request.clone(),
            tx,
        });
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }

    fn model_id(&self) -> &str {
        "manual"
    }
}

/// Test-side end of one streamed response; dropping it ends the stream
pub struct ManualStream {
    pub request: StreamRequest,
    tx: mpsc::UnboundedSender<Result<StreamChunk, LlmError>>,
}

impl ManualStream {
    pub fn text(&self, text: &str) {
        let _ = self.tx.send(Ok(StreamChunk::text(text)));
    }

    pub fn citations(&self, citations: Vec<crate::llm::Citation>) {
        let _ = self.tx.send(Ok(StreamChunk::citations(citations)));
    }

    pub fn error(&self, error: LlmError) {
        let _ = self.tx.send(Err(error));
    }

    /// End the stream normally
    pub fn finish(self) {}

    /// True once the consumer dropped the stream
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{ConversationController, ConversationSnapshot, MessageKind, Role};
    use crate::llm::Citation;
    use crate::runtime::{ConversationHandle, ConversationRuntime};
    use crate::streaming::{StreamingClient, StreamingConfig};
    use std::sync::Arc;
    use std::time::Duration;

    const NOTICE: &str = "Sorry, something went wrong.";

    fn spawn(backend: Arc<dyn ChatBackend>) -> ConversationHandle {
        let controller = ConversationController::new(NOTICE).with_greeting("Welcome!");
        let client = StreamingClient::new(backend, StreamingConfig::default());
        ConversationRuntime::spawn(controller, client)
    }

    async fn wait_until(
        handle: &ConversationHandle,
        predicate: impl FnMut(&ConversationSnapshot) -> bool,
    ) -> ConversationSnapshot {
        let mut rx = handle.subscribe();
        let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for snapshot")
            .expect("runtime stopped")
            .clone();
        snapshot
    }

    #[tokio::test]
    async fn test_mock_backend_queue() {
        let backend = ScriptedBackend::new();
        backend.queue_stream(vec![Ok(StreamChunk::text("Hello"))]);

        let request = StreamRequest {
            system_instruction: None,
            history: vec![],
            utterance: "hi".to_string(),
            web_grounding: false,
            minimal_latency: false,
        };

        let items: Vec<_> = backend.open_stream(&request).await.unwrap().collect().await;
        assert_eq!(items.len(), 1);

        // Second call should fail (no more responses)
        assert!(backend.open_stream(&request).await.is_err());
        assert_eq!(backend.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_initial_snapshot_has_greeting() {
        let handle = spawn(Arc::new(ScriptedBackend::new()));
        let snap = handle.snapshot();
        assert_eq!(snap.messages.len(), 1);
        assert_eq!(snap.messages[0].kind, MessageKind::Greeting);
        assert!(!snap.is_loading);
    }

    #[tokio::test]
    async fn test_simple_streamed_reply() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.queue_stream(vec![
            Ok(StreamChunk::text("Hi")),
            Ok(StreamChunk::citations(vec![Citation::new("https://a", "A")])),
            Ok(StreamChunk::text(" there")),
        ]);
        let handle = spawn(backend.clone());

        handle.send("hello").await.unwrap();
        let snap = wait_until(&handle, |s| s.messages.len() == 3 && !s.is_loading).await;

        assert_eq!(snap.messages[1].role, Role::User);
        assert_eq!(snap.messages[1].content, "hello");
        let reply = &snap.messages[2];
        assert_eq!(reply.content, "Hi there");
        assert!(!reply.is_streaming);
        assert_eq!(reply.citations, vec![Citation::new("https://a", "A")]);

        // The greeting never reaches the backend
        assert!(backend.recorded_requests()[0].history.is_empty());
    }

    #[tokio::test]
    async fn test_blank_message_ignored() {
        let backend = Arc::new(ScriptedBackend::new());
        let handle = spawn(backend.clone());

        handle.send("   ").await.unwrap();
        handle.cancel().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(handle.snapshot().messages.len(), 1);
        assert!(backend.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_before_first_fragment() {
        let backend = Arc::new(ManualBackend::new());
        let handle = spawn(backend.clone());

        handle.send("hello").await.unwrap();
        let stream = backend.next_stream().await;
        wait_until(&handle, |s| s.is_loading).await;

        handle.cancel().await.unwrap();
        let snap = wait_until(&handle, |s| !s.is_loading).await;
        assert_eq!(snap.messages[2].content, "");
        assert!(!snap.messages[2].is_streaming);
        assert_ne!(snap.messages[2].content, NOTICE);

        // Anything the backend still produces is ignored
        stream.text("late");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(handle.snapshot(), snap);
    }

    #[tokio::test]
    async fn test_supersede_isolates_turns() {
        let backend = Arc::new(ManualBackend::new());
        let handle = spawn(backend.clone());

        handle.send("A").await.unwrap();
        let first = backend.next_stream().await;
        first.text("a1");
        wait_until(&handle, |s| s.messages.get(2).is_some_and(|m| m.content == "a1")).await;

        handle.send("B").await.unwrap();
        let second = backend.next_stream().await;
        let history: Vec<_> = second.request.history.iter().map(|t| t.text.clone()).collect();
        first.text("a2");
        second.text("b1");
        second.finish();

        let snap = wait_until(&handle, |s| s.messages.len() == 5 && !s.is_loading).await;
        assert_eq!(snap.messages[2].content, "a1");
        assert_eq!(snap.messages[4].content, "b1");
        assert!(snap.messages.iter().all(|m| !m.is_streaming));
        assert_eq!(history, vec!["A", "a1"]);
    }

    #[tokio::test]
    async fn test_failure_shows_notice() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.queue_stream(vec![
            Ok(StreamChunk::text("Par")),
            Err(LlmError::server_error("boom")),
        ]);
        let handle = spawn(backend);

        handle.send("hello").await.unwrap();
        let snap = wait_until(&handle, |s| s.messages.len() == 3 && !s.is_loading).await;
        assert_eq!(snap.messages[2].content, NOTICE);
        assert!(!snap.messages[2].is_streaming);
    }

    #[tokio::test]
    async fn test_conversation_continues_after_failure() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.queue_error(LlmError::rate_limit("slow down"));
        backend.queue_stream(vec![Ok(StreamChunk::text("ok"))]);
        let handle = spawn(backend.clone());

        handle.send("one").await.unwrap();
        wait_until(&handle, |s| s.messages.len() == 3 && !s.is_loading).await;
        handle.send("two").await.unwrap();
        let snap = wait_until(&handle, |s| s.messages.len() == 5 && !s.is_loading).await;

        assert_eq!(snap.messages[2].content, NOTICE);
        assert_eq!(snap.messages[4].content, "ok");
    }
}
