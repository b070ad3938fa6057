//! API request and response types

use serde::{Deserialize, Serialize};

/// Request to send a user message
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub text: String,
}

/// Response for the send action
#[derive(Debug, Serialize)]
pub struct SendResponse {
    /// False when the text was blank and nothing was sent
    pub accepted: bool,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
