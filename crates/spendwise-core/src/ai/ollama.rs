//! Ollama backend implementation
//!
//! HTTP client for the Ollama `/api/generate` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{OracleConfig, DEFAULT_OLLAMA_MODEL};
use crate::error::{Error, Result};

use super::parsing::category_prompt;
use super::{http_client, CategoryOracle, ORACLE_TEMPERATURE};

/// Ollama backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create from configuration. Returns None without a host.
    pub fn from_config(config: &OracleConfig) -> Option<Self> {
        let host = config.host.as_deref()?;
        let model = config.model.as_deref().unwrap_or(DEFAULT_OLLAMA_MODEL);

        let mut backend = Self::new(host, model);
        backend.http_client = http_client(config.timeout());
        Some(backend)
    }
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl CategoryOracle for OllamaBackend {
    async fn suggest_category(&self, merchant: &str, allowed: &[&str]) -> Result<String> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: category_prompt(merchant, allowed),
            stream: false,
            options: OllamaOptions {
                temperature: ORACLE_TEMPERATURE,
            },
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::Oracle(format!("Ollama API error {}", status)));
        }

        let ollama_response: OllamaResponse = response.json().await?;
        debug!("Ollama response: {}", ollama_response.response);

        Ok(ollama_response.response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BUILTIN_CATEGORY_IDS;
    use crate::test_utils::MockOracleServer;

    #[tokio::test]
    async fn test_suggest_category_against_mock_server() {
        let server = MockOracleServer::start().await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2");

        let raw = backend
            .suggest_category("AMAZON MKTPLACE", &BUILTIN_CATEGORY_IDS)
            .await
            .unwrap();
        assert_eq!(raw.trim(), "cat-shop");
        assert!(backend.health_check().await);
    }

    #[tokio::test]
    async fn test_server_error_is_oracle_error() {
        let server = MockOracleServer::start_failing().await;
        let backend = OllamaBackend::new(&server.url(), "llama3.2");
        assert!(matches!(
            backend
                .suggest_category("AMAZON", &BUILTIN_CATEGORY_IDS)
                .await,
            Err(Error::Oracle(_))
        ));
    }
}
