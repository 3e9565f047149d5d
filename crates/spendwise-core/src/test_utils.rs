//! Test utilities for spendwise-core
//!
//! This module provides a mock oracle server speaking the Gemini,
//! OpenAI-compatible and Ollama wire formats, for backend and integration
//! tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::ai::guess_category;

/// How the mock server answers
#[derive(Clone)]
struct ServerBehavior {
    /// Fixed reply text; None guesses from the merchant in the prompt
    reply: Option<String>,
    /// Respond 500 to everything
    fail: bool,
}

type Shared = Arc<ServerBehavior>;

/// Mock oracle server for testing and development
pub struct MockOracleServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOracleServer {
    /// Start a server that guesses categories from merchant names
    pub async fn start() -> Self {
        Self::start_with(ServerBehavior {
            reply: None,
            fail: false,
        })
        .await
    }

    /// Start a server that always answers with `reply`
    pub async fn start_with_reply(reply: &str) -> Self {
        Self::start_with(ServerBehavior {
            reply: Some(reply.to_string()),
            fail: false,
        })
        .await
    }

    /// Start a server that fails every request with HTTP 500
    pub async fn start_failing() -> Self {
        Self::start_with(ServerBehavior {
            reply: None,
            fail: true,
        })
        .await
    }

    async fn start_with(behavior: ServerBehavior) -> Self {
        let app = Router::new()
            .route("/v1beta/models/:model", get(handle_health).post(handle_gemini))
            .route("/v1/models", get(handle_health))
            .route("/v1/chat/completions", post(handle_openai))
            .route("/api/tags", get(handle_health))
            .route("/api/generate", post(handle_ollama))
            .with_state(Arc::new(behavior));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOracleServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn answer(behavior: &ServerBehavior, prompt: &str) -> String {
    match behavior.reply {
        Some(ref reply) => reply.clone(),
        None => guess_category(&extract_merchant(prompt)).to_string(),
    }
}

/// Pull the quoted merchant out of a categorization prompt
fn extract_merchant(prompt: &str) -> String {
    const START: &str = "Categorize this merchant: \"";
    const END: &str = "\". Choose";
    match (prompt.find(START), prompt.rfind(END)) {
        (Some(s), Some(e)) if s + START.len() <= e => prompt[s + START.len()..e].to_string(),
        _ => String::new(),
    }
}

fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "mock failure").into_response()
}

async fn handle_health(State(behavior): State<Shared>) -> Response {
    if behavior.fail {
        return server_error();
    }
    Json(json!({ "models": [{ "name": "mock" }] })).into_response()
}

/// Gemini generateContent endpoint (`/v1beta/models/<model>:generateContent`)
async fn handle_gemini(State(behavior): State<Shared>, Json(body): Json<Value>) -> Response {
    if behavior.fail {
        return server_error();
    }
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default();
    let text = answer(&behavior, prompt);
    Json(json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": format!("{}\n", text) }] } }]
    }))
    .into_response()
}

/// OpenAI chat completions endpoint
async fn handle_openai(State(behavior): State<Shared>, Json(body): Json<Value>) -> Response {
    if behavior.fail {
        return server_error();
    }
    let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
    let text = answer(&behavior, prompt);
    Json(json!({
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": text } }]
    }))
    .into_response()
}

/// Ollama generate endpoint
async fn handle_ollama(State(behavior): State<Shared>, Json(body): Json<Value>) -> Response {
    if behavior.fail {
        return server_error();
    }
    let prompt = body["prompt"].as_str().unwrap_or_default();
    let text = answer(&behavior, prompt);
    Json(json!({
        "model": body["model"],
        "response": text,
        "done": true
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_merchant() {
        let prompt = crate::ai::category_prompt("Joe's \"Best\" Pizza", &["cat-food"]);
        assert_eq!(extract_merchant(&prompt), "Joe's \"Best\" Pizza");
        assert_eq!(extract_merchant("hello"), "");
    }
}
