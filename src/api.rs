//! HTTP API for the conversation
//!
//! A thin presentation adapter: every route goes through the
//! [`ConversationHandle`], and the SSE route streams published snapshots.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::runtime::ConversationHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub conversation: ConversationHandle,
}

impl AppState {
    pub fn new(conversation: ConversationHandle) -> Self {
        Self { conversation }
    }
}
