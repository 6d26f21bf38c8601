//! Pluggable AI backend abstraction
//!
//! This module is the classification port: the only code that talks to a
//! language model. The category classifier owns prompt construction and
//! response validation; a backend only ships a system/user prompt pair and
//! returns the raw content.
//!
//! # Architecture
//!
//! - `AIBackend` trait: the interface every backend implements
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (ollama, openai_compatible, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-4o-mini)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;

#[cfg(any(test, feature = "test-utils"))]
pub(crate) use mock::keyword_response;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::{Error, Result};

/// Trait defining the interface for all AI backends
///
/// Failures surface as `Error::QuotaExceeded` when the provider refuses for
/// rate or billing reasons, and as `Error::Service` (or a transport error)
/// otherwise.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Send one system/user prompt pair and return the model's content
    async fn classify(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        expect_json: bool,
    ) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Map a non-success HTTP status to the port's failure kinds
pub(crate) fn status_error(backend: &str, status: StatusCode, body: &str) -> Error {
    if status == StatusCode::TOO_MANY_REQUESTS {
        Error::QuotaExceeded(format!("{} returned {}: {}", backend, status, body))
    } else {
        Error::Service(format!("{} returned {}: {}", backend, status, body))
    }
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
/// Cloning is cheap (shared HTTP client), so each concurrent classification
/// task gets its own handle.
#[derive(Clone)]
pub enum AIClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// OpenAI-compatible backend (OpenAI, vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use:
    /// - `ollama` (default): Uses OLLAMA_HOST and OLLAMA_MODEL
    /// - `openai_compatible`: Uses OPENAI_COMPATIBLE_HOST, OPENAI_COMPATIBLE_MODEL
    ///   and OPENAI_COMPATIBLE_API_KEY
    /// - `mock`: Creates a mock backend for testing
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "ollama".to_string());

        match backend.to_lowercase().as_str() {
            "ollama" => OllamaBackend::from_env().map(AIClient::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to ollama");
                OllamaBackend::from_env().map(AIClient::Ollama)
            }
        }
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create an OpenAI-compatible backend directly
    pub fn openai_compatible(host: &str, model: &str, api_key: Option<&str>) -> Self {
        let backend = match api_key {
            Some(key) => OpenAICompatibleBackend::with_api_key(host, model, key),
            None => OpenAICompatibleBackend::new(host, model),
        };
        AIClient::OpenAICompatible(backend)
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Short backend name for display
    pub fn kind(&self) -> &'static str {
        match self {
            AIClient::Ollama(_) => "ollama",
            AIClient::OpenAICompatible(_) => "openai_compatible",
            AIClient::Mock(_) => "mock",
        }
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn classify(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        expect_json: bool,
    ) -> Result<String> {
        match self {
            AIClient::Ollama(b) => b.classify(system_prompt, user_prompt, expect_json).await,
            AIClient::OpenAICompatible(b) => {
                b.classify(system_prompt, user_prompt, expect_json).await
            }
            AIClient::Mock(b) => b.classify(system_prompt, user_prompt, expect_json).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_client_mock() {
        let client = AIClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
        assert_eq!(client.kind(), "mock");
    }

    #[test]
    fn test_ai_client_constructors() {
        let ollama = AIClient::ollama("http://localhost:11434/", "gemma3");
        assert_eq!(ollama.host(), "http://localhost:11434");
        assert_eq!(ollama.model(), "gemma3");

        let openai = AIClient::openai_compatible("http://localhost:8000", "gpt-4o-mini", None);
        assert_eq!(openai.kind(), "openai_compatible");
    }

    #[test]
    fn test_status_error_mapping() {
        let quota = status_error("test", StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(matches!(quota, Error::QuotaExceeded(_)));

        let service = status_error("test", StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(service, Error::Service(_)));
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let client = AIClient::mock();
        assert!(client.health_check().await);
    }
}
