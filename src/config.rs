//! Process configuration from environment variables

use crate::llm::LlmConfig;
use crate::persona::Persona;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No Gemini credentials configured. Set GEMINI_API_KEY or LLM_GATEWAY.")]
    MissingCredentials,
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Everything the server reads at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Per-event idle limit for streaming sessions
    pub stream_idle_timeout: Option<Duration>,
    pub llm: LlmConfig,
    pub persona: Persona,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = parse_var("CHAT_PORT")?.unwrap_or(DEFAULT_PORT);
        let stream_idle_timeout = parse_var::<u64>("CHAT_STREAM_IDLE_TIMEOUT_SECS")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(Self {
            port,
            stream_idle_timeout,
            llm: LlmConfig::from_env(),
            persona: Persona::from_env(),
        })
    }
}

/// Read a variable, treating blank values as unset
pub fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    non_empty_var(name)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { name, value })
        })
        .transpose()
}
