//! Decision providers: the text-completion backends behind LLM agents.
//!
//! The core only depends on the [`DecisionProvider`] contract. HTTP clients
//! for the two supported backends live with the embedding application; the
//! base URLs and API-key variable names they need are carried here.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model used when an agent spec names none.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Provider failures. Both count as one failed decision attempt.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Network, authentication or rate-limit failure.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("provider timed out after {0:?}")]
    Timeout(Duration),
}

/// Supported completion backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    OpenRouter,
    Groq,
}

impl Backend {
    /// OpenAI-compatible API root.
    #[must_use]
    pub const fn base_url(self) -> &'static str {
        match self {
            Backend::OpenRouter => "https://openrouter.ai/api/v1",
            Backend::Groq => "https://api.groq.com/openai/v1",
        }
    }

    /// Environment variable the embedding application reads the key from.
    #[must_use]
    pub const fn api_key_var(self) -> &'static str {
        match self {
            Backend::OpenRouter => "OPENROUTER_API_KEY",
            Backend::Groq => "GROQ_API_KEY",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Backend::OpenRouter => "openrouter",
            Backend::Groq => "groq",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown backend name.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown backend `{0}` (expected openrouter or groq)")]
pub struct UnknownBackend(pub String);

impl FromStr for Backend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openrouter" => Ok(Backend::OpenRouter),
            "groq" => Ok(Backend::Groq),
            other => Err(UnknownBackend(other.to_string())),
        }
    }
}

/// Which model to ask, and how.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub backend: Backend,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: Backend::OpenRouter,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            max_tokens: 64,
        }
    }
}

impl ModelConfig {
    pub fn new(backend: Backend, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A text-completion backend.
///
/// Implementations must be shareable across concurrently running games.
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    /// Complete `prompt`, returning the raw reply text.
    async fn complete(&self, prompt: &str, model: &ModelConfig) -> Result<String, ProviderError>;
}
