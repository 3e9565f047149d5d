//! OpenAI-compatible backend implementation
//!
//! Works with any server that implements the OpenAI chat completions API:
//! - vLLM (http://localhost:8000)
//! - LocalAI (http://localhost:8080)
//! - llama-server / llama.cpp (http://localhost:8080)
//!
//! # Configuration
//!
//! Environment variables:
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{OracleConfig, DEFAULT_OPENAI_MODEL};
use crate::error::{Error, Result};

use super::parsing::category_prompt;
use super::{http_client, CategoryOracle, ORACLE_TEMPERATURE};

/// OpenAI-compatible backend
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAICompatibleBackend {
    /// Create a new OpenAI-compatible backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
        }
    }

    /// Create with an API key
    pub fn with_api_key(base_url: &str, model: &str, api_key: &str) -> Self {
        let mut backend = Self::new(base_url, model);
        backend.api_key = Some(api_key.to_string());
        backend
    }

    /// Create from configuration. Returns None without a host.
    pub fn from_config(config: &OracleConfig) -> Option<Self> {
        let host = config.host.as_deref()?;
        let model = config.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL);

        let mut backend = Self::new(host, model);
        backend.api_key = config.api_key.clone();
        backend.http_client = http_client(config.timeout());
        Some(backend)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key {
            Some(ref api_key) => req.header("Authorization", format!("Bearer {}", api_key)),
            None => req,
        }
    }
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[async_trait]
impl CategoryOracle for OpenAICompatibleBackend {
    async fn suggest_category(&self, merchant: &str, allowed: &[&str]) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: category_prompt(merchant, allowed),
            }],
            temperature: ORACLE_TEMPERATURE,
            stream: false,
        };

        let response = self
            .authorize(
                self.http_client
                    .post(format!("{}/v1/chat/completions", self.base_url))
                    .json(&request),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Oracle(format!(
                "OpenAI API error {}: {}",
                status, body
            )));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;
        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Oracle("No response from OpenAI API".into()))?;

        debug!("OpenAI-compatible response: {}", content);
        Ok(content)
    }

    async fn health_check(&self) -> bool {
        match self
            .authorize(self.http_client.get(format!("{}/v1/models", self.base_url)))
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
        let backend = OpenAICompatibleBackend::with_api_key(&server.url(), "test-model", "sk-test");

        let raw = backend
            .suggest_category("Spotify Premium", &BUILTIN_CATEGORY_IDS)
            .await
            .unwrap();
        assert_eq!(raw.trim(), "cat-subs");
        assert!(backend.health_check().await);
    }

    #[tokio::test]
    async fn test_fixed_reply_passes_through_unvalidated() {
        let server = MockOracleServer::start_with_reply("I think Food").await;
        let backend = OpenAICompatibleBackend::new(&server.url(), "test-model");

        let raw = backend
            .suggest_category("Blue Cafe", &BUILTIN_CATEGORY_IDS)
            .await
            .unwrap();
        assert_eq!(raw, "I think Food");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_error() {
        let backend = OpenAICompatibleBackend::new("http://127.0.0.1:1", "test-model");
        assert!(backend
            .suggest_category("Blue Cafe", &BUILTIN_CATEGORY_IDS)
            .await
            .is_err());
        assert!(!backend.health_check().await);
    }
}
