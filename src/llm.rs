//! LLM backend abstraction
//!
//! A backend turns one [`StreamRequest`] into a stream of [`StreamChunk`]s.

mod config;
mod error;
mod gemini;
mod types;

pub use config::LlmConfig;
pub use error::LlmError;
#[cfg(test)]
pub use error::LlmErrorKind;
pub use gemini::GeminiBackend;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for streaming LLM providers
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Issue the request and return the response as an incremental stream.
    ///
    /// Errors before the first event (connect failure, non-2xx status) are
    /// returned here; errors afterwards arrive as items of the stream.
    async fn open_stream(&self, request: &StreamRequest) -> Result<ChunkStream, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: ChatBackend + ?Sized> ChatBackend for Arc<T> {
    async fn open_stream(&self, request: &StreamRequest) -> Result<ChunkStream, LlmError> {
        (**self).open_stream(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for chat backends
pub struct LoggingBackend {
    inner: Arc<dyn ChatBackend>,
    model_id: String,
}

impl LoggingBackend {
    pub fn new(inner: Arc<dyn ChatBackend>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl ChatBackend for LoggingBackend {
    async fn open_stream(&self, request: &StreamRequest) -> Result<ChunkStream, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.open_stream(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(_) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    history_turns = request.history.len(),
                    "LLM stream opened"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = e.kind.as_str(),
                    "LLM stream failed to open"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
