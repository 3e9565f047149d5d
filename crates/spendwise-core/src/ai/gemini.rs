//! Google Gemini backend implementation
//!
//! Calls the `generateContent` REST endpoint. Requires an API key
//! (`GEMINI_API_KEY` or `API_KEY`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{OracleConfig, DEFAULT_GEMINI_HOST, DEFAULT_GEMINI_MODEL};
use crate::error::{Error, Result};

use super::parsing::category_prompt;
use super::{http_client, CategoryOracle, ORACLE_TEMPERATURE};

/// Gemini backend
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    /// Create a backend against the public Gemini endpoint
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_host(DEFAULT_GEMINI_HOST, api_key, model)
    }

    /// Create a backend against a specific host (proxies, tests)
    pub fn with_host(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Create from configuration. Returns None without an API key.
    pub fn from_config(config: &OracleConfig) -> Option<Self> {
        let api_key = config.api_key.as_deref().filter(|k| !k.trim().is_empty())?;
        let host = config.host.as_deref().unwrap_or(DEFAULT_GEMINI_HOST);
        let model = config.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);

        let mut backend = Self::with_host(host, api_key, model);
        backend.http_client = http_client(config.timeout());
        Some(backend)
    }

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.base_url, self.model)
    }
}

/// Gemini generateContent request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

/// Gemini generateContent response
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[async_trait]
impl CategoryOracle for GeminiBackend {
    async fn suggest_category(&self, merchant: &str, allowed: &[&str]) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(category_prompt(merchant, allowed)),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: ORACLE_TEMPERATURE,
            },
        };

        let response = self
            .http_client
            .post(format!("{}:generateContent", self.model_url()))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Oracle(format!("Gemini API error {}: {}", status, body)));
        }

        let gemini_response: GenerateContentResponse = response.json().await?;

        let text: String = gemini_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .ok_or_else(|| Error::Oracle("No candidates in Gemini response".into()))?;

        debug!("Gemini response: {}", text);
        Ok(text)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(self.model_url())
            .header("x-goog-api-key", &self.api_key)
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
        let backend = GeminiBackend::with_host(&server.url(), "test-key", "gemini-test");

        let raw = backend
            .suggest_category("Uber Trip", &BUILTIN_CATEGORY_IDS)
            .await
            .unwrap();
        assert_eq!(raw.trim(), "cat-trans");
        assert!(backend.health_check().await);
    }

    #[tokio::test]
    async fn test_server_error_is_oracle_error() {
        let server = MockOracleServer::start_failing().await;
        let backend = GeminiBackend::with_host(&server.url(), "test-key", "gemini-test");

        let err = backend
            .suggest_category("Uber", &BUILTIN_CATEGORY_IDS)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Oracle(_)));
        assert!(!backend.health_check().await);
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some("hi".into()),
                }],
            }],
            generation_config: GenerationConfig { temperature: 0.1 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert!(json["generationConfig"]["temperature"].is_number());
    }
}
