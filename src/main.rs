//! Grounded Chat - streaming chat assistant backed by Gemini with web search
//!
//! One conversation lives in memory. Replies stream in token by token and carry
//! the web sources the model grounded them on.

mod api;
mod config;
mod conversation;
mod llm;
mod persona;
mod runtime;
mod streaming;

use api::{create_router, AppState};
use config::AppConfig;
use conversation::ConversationController;
use llm::{GeminiBackend, LoggingBackend};
use runtime::ConversationRuntime;
use std::net::SocketAddr;
use std::sync::Arc;
use streaming::{StreamingClient, StreamingConfig};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grounded_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env()?;

    let backend = GeminiBackend::new(config.llm.credentials()?, config.llm.model())?;
    tracing::info!(model = %config.llm.model(), "Gemini backend initialized");
    let backend = Arc::new(LoggingBackend::new(Arc::new(backend)));

    let persona = config.persona;
    let client = StreamingClient::new(
        backend,
        StreamingConfig {
            system_instruction: Some(persona.system_instruction),
            idle_timeout: config.stream_idle_timeout,
            ..StreamingConfig::default()
        },
    );
    let controller =
        ConversationController::new(persona.failure_notice).with_greeting(persona.greeting);
    let conversation = ConversationRuntime::spawn(controller, client);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(AppState::new(conversation))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Grounded chat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
