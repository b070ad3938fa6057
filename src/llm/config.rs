//! Backend configuration read from the environment

use crate::config::{non_empty_var, ConfigError};

/// Default model: the fastest Gemini tier, chosen for low latency
pub const DEFAULT_MODEL: &str = "gemini-flash-lite-latest";

/// Configuration for the Gemini backend
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub gemini_api_key: Option<String>,
    /// Gateway URL; when set, the gateway handles authentication
    pub gateway: Option<String>,
    /// Model name, defaults to [`DEFAULT_MODEL`]
    pub model: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            gateway: non_empty_var("LLM_GATEWAY"),
            model: non_empty_var("GEMINI_MODEL"),
        }
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Resolve the credential the backend should use.
    ///
    /// Gateway mode needs no key; direct mode requires a non-empty one.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        if let Some(gateway) = &self.gateway {
            return Ok(Credentials::Gateway(gateway.clone()));
        }
        match &self.gemini_api_key {
            Some(key) if !key.is_empty() => Ok(Credentials::ApiKey(key.clone())),
            _ => Err(ConfigError::MissingCredentials),
        }
    }
}

/// How requests reach the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Direct API access with a key
    ApiKey(String),
    /// Gateway base URL that injects auth itself
    Gateway(String),
}
