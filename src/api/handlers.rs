//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{ErrorResponse, SendRequest, SendResponse, SuccessResponse};
use super::AppState;
use crate::conversation::ConversationSnapshot;
use crate::runtime::RuntimeError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/conversation", get(get_conversation))
        .route("/api/conversation/send", post(send_message))
        .route("/api/conversation/cancel", post(cancel_response))
        .route("/api/conversation/stream", get(stream_conversation))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Conversation
// ============================================================

async fn get_conversation(State(state): State<AppState>) -> Json<ConversationSnapshot> {
    Json(state.conversation.snapshot())
}

async fn stream_conversation(State(state): State<AppState>) -> impl IntoResponse {
    sse_stream(state.conversation.subscribe())
}

// ============================================================
// User Actions
// ============================================================

async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendRequest>,
) -> Result<Json<SendResponse>, AppError> {
    let accepted = !req.text.trim().is_empty();
    state.conversation.send(req.text).await?;
    Ok(Json(SendResponse { accepted }))
}

async fn cancel_response(State(state): State<AppState>) -> Result<Json<SuccessResponse>, AppError> {
    state.conversation.cancel().await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("grounded-chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    Internal(String),
}

impl From<RuntimeError> for AppError {
    fn from(e: RuntimeError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
