//! Pluggable category oracle
//!
//! The oracle is the fallback used when no categorization rule matches a
//! merchant. It is asked for one id from a closed list and its answer is
//! validated before anything uses it.
//!
//! # Architecture
//!
//! - `CategoryOracle` trait: the interface every backend implements
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `OpenAICompatibleBackend`,
//!   `OllamaBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let oracle = AIClient::from_config(&config.oracle);
//!
//! if let Some(ref client) = oracle {
//!     let raw = client.suggest_category("Blue Cafe", &BUILTIN_CATEGORY_IDS).await?;
//!     let verdict = parse_category_response(&raw, &BUILTIN_CATEGORY_IDS);
//! }
//! ```

mod gemini;
mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use parsing::{category_prompt, parse_category_response, OracleVerdict};

#[cfg(any(test, feature = "test-utils"))]
pub(crate) use mock::guess_category;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::{OracleBackendKind, OracleConfig};
use crate::error::Result;

/// Temperature used for every oracle request
pub(crate) const ORACLE_TEMPERATURE: f32 = 0.1;

/// Interface for all category oracle backends
#[async_trait]
pub trait CategoryOracle: Send + Sync {
    /// Ask for the best category id for `merchant` among `allowed`
    ///
    /// Returns the raw response text. Callers validate it with
    /// `parse_category_response`.
    async fn suggest_category(&self, merchant: &str, allowed: &[&str]) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// HTTP client with the oracle request timeout applied
pub(crate) fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!("Failed to build HTTP client with timeout: {}", e);
            Client::new()
        })
}

/// Concrete oracle client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Google Gemini (generateContent REST API)
    Gemini(GeminiBackend),
    /// OpenAI-compatible backend (vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an oracle client from configuration
    ///
    /// Returns None when the backend is disabled or its required settings
    /// (API key for Gemini, host for the self-hosted backends) are missing.
    /// Without a client the resolver only uses rules.
    pub fn from_config(config: &OracleConfig) -> Option<Self> {
        let client = match config.backend {
            OracleBackendKind::Gemini => GeminiBackend::from_config(config).map(AIClient::Gemini),
            OracleBackendKind::OpenaiCompatible => {
                OpenAICompatibleBackend::from_config(config).map(AIClient::OpenAICompatible)
            }
            OracleBackendKind::Ollama => OllamaBackend::from_config(config).map(AIClient::Ollama),
            OracleBackendKind::Mock => Some(AIClient::Mock(MockBackend::new())),
            OracleBackendKind::None => None,
        };

        if client.is_none() && config.backend != OracleBackendKind::None {
            debug!(backend = ?config.backend, "Oracle not configured, using rules only");
        }
        client
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }
}

// Implement CategoryOracle for AIClient by delegating to the inner backend
#[async_trait]
impl CategoryOracle for AIClient {
    async fn suggest_category(&self, merchant: &str, allowed: &[&str]) -> Result<String> {
        match self {
            AIClient::Gemini(b) => b.suggest_category(merchant, allowed).await,
            AIClient::OpenAICompatible(b) => b.suggest_category(merchant, allowed).await,
            AIClient::Ollama(b) => b.suggest_category(merchant, allowed).await,
            AIClient::Mock(b) => b.suggest_category(merchant, allowed).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Gemini(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Ollama(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Ollama(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_requires_api_key() {
        let config = OracleConfig::default();
        assert!(AIClient::from_config(&config).is_none());

        let config = OracleConfig {
            api_key: Some("key".into()),
            ..Default::default()
        };
        let client = AIClient::from_config(&config).unwrap();
        assert!(matches!(client, AIClient::Gemini(_)));
        assert_eq!(client.model(), crate::config::DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn test_self_hosted_backends_require_host() {
        for backend in [OracleBackendKind::Ollama, OracleBackendKind::OpenaiCompatible] {
            let mut config = OracleConfig {
                backend,
                ..Default::default()
            };
            assert!(AIClient::from_config(&config).is_none());
            config.host = Some("http://localhost:1234/".into());
            let client = AIClient::from_config(&config).unwrap();
            assert_eq!(client.host(), "http://localhost:1234");
        }
    }

    #[test]
    fn test_disabled_backend() {
        let config = OracleConfig {
            backend: OracleBackendKind::None,
            api_key: Some("key".into()),
            ..Default::default()
        };
        assert!(AIClient::from_config(&config).is_none());
    }

    #[tokio::test]
    async fn test_mock_client_delegates() {
        let client = AIClient::mock();
        assert!(client.health_check().await);
        let raw = client
            .suggest_category("NETFLIX.COM", &crate::models::BUILTIN_CATEGORY_IDS)
            .await
            .unwrap();
        assert_eq!(raw, "cat-subs");
    }
}
