//! Google Gemini streaming backend
//!
//! Talks to `streamGenerateContent` with `alt=sse`: every SSE `data:` payload is
//! a partial `GenerateContentResponse` carrying text parts and, when search
//! grounding kicked in, grounding metadata.

use super::config::Credentials;
use super::types::{ChunkStream, Citation, StreamChunk, StreamRequest};
use super::{ChatBackend, LlmError};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{future, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DIRECT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini service implementation
pub struct GeminiBackend {
    client: Client,
    url: String,
    /// `None` in gateway mode
    api_key: Option<String>,
    model_id: String,
}

impl GeminiBackend {
    pub fn new(credentials: Credentials, model: &str) -> Result<Self, LlmError> {
        let (base_url, api_key) = match credentials {
            Credentials::ApiKey(key) => (DIRECT_BASE_URL.to_string(), Some(key)),
            Credentials::Gateway(gw) => (format!("{}/gemini", gw.trim_end_matches('/')), None),
        };

        // No overall timeout: a healthy stream may stay open for minutes.
        // Idle detection lives in the streaming client.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: format!("{base_url}/v1beta/models/{model}:streamGenerateContent?alt=sse"),
            api_key,
            model_id: model.to_string(),
        })
    }

    fn translate_request(request: &StreamRequest) -> GeminiRequest {
        let system_instruction = request
            .system_instruction
            .as_ref()
            .filter(|s| !s.is_empty())
            .map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart::text(text.clone())],
            });

        // Empty turns (e.g. an answer cancelled before its first fragment)
        // are rejected by the API, so they are left out.
        let mut contents: Vec<GeminiContent> = request
            .history
            .iter()
            .filter(|turn| !turn.text.is_empty())
            .map(|turn| GeminiContent {
                role: Some(turn.role.as_str().to_string()),
                parts: vec![GeminiPart::text(turn.text.clone())],
            })
            .collect();

        contents.push(GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart::text(request.utterance.clone())],
        });

        let tools = request.web_grounding.then(|| {
            vec![GeminiTool {
                google_search: GoogleSearch {},
            }]
        });

        let generation_config = request.minimal_latency.then_some(GeminiGenerationConfig {
            thinking_config: Some(GeminiThinkingConfig { thinking_budget: 0 }),
        });

        GeminiRequest {
            contents,
            system_instruction,
            tools,
            generation_config,
        }
    }

    /// Parse one SSE `data:` payload into a chunk
    fn parse_event(data: &str) -> Result<StreamChunk, LlmError> {
        let resp: GeminiStreamResponse = serde_json::from_str(data).map_err(|e| {
            LlmError::stream(format!("Failed to parse stream event: {e} - data: {data}"))
        })?;
        Self::normalize_chunk(resp)
    }

    fn normalize_chunk(resp: GeminiStreamResponse) -> Result<StreamChunk, LlmError> {
        if let Some(error) = resp.error {
            let code = error.code.and_then(|c| u16::try_from(c).ok()).unwrap_or(0);
            return Err(LlmError::from_status(code, &error.message));
        }

        let Some(candidate) = resp.candidates.into_iter().next() else {
            // Usage-only trailer events carry no candidates
            return Ok(StreamChunk::default());
        };

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|part| !part.thought.unwrap_or(false))
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        let citations = candidate
            .grounding_metadata
            .map(|metadata| {
                metadata
                    .grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| chunk.web)
                    .filter_map(|web| match web.uri {
                        Some(uri) if !uri.is_empty() => {
                            Some(Citation::new(uri, web.title.unwrap_or_default()))
                        }
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(StreamChunk {
            text: (!text.is_empty()).then_some(text),
            citations,
        })
    }

    fn error_from_body(status: reqwest::StatusCode, body: &str) -> LlmError {
        if let Ok(error_resp) = serde_json::from_str::<GeminiErrorResponse>(body) {
            return LlmError::from_status(status.as_u16(), &error_resp.error.message);
        }
        LlmError::from_status(status.as_u16(), body)
    }
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    async fn open_stream(&self, request: &StreamRequest) -> Result<ChunkStream, LlmError> {
        let gemini_request = Self::translate_request(request);

        let mut builder = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream");
        if let Some(key) = &self.api_key {
            builder = builder.header("x-goog-api-key", key);
        }

        let response = builder.json(&gemini_request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::error_from_body(status, &body));
        }

        let chunks = response
            .bytes_stream()
            .eventsource()
            .filter_map(|event| {
                future::ready(match event {
                    Ok(event) if event.data.trim().is_empty() => None,
                    Ok(event) => Some(Self::parse_event(&event.data)),
                    Err(e) => Some(Err(LlmError::network(format!("SSE stream error: {e}")))),
                })
            })
            .boxed();

        Ok(chunks)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    /// Set on reasoning summaries, which are not answer text
    #[serde(skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

impl GeminiPart {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            thought: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<GeminiThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiStreamResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    grounding_metadata: Option<GeminiGroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GeminiGroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GeminiGroundingChunk {
    web: Option<GeminiWebSource>,
}

#[derive(Debug, Deserialize)]
struct GeminiWebSource {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
    code: Option<i64>,
}
