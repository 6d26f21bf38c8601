//! Test utilities for kakeibo-core
//!
//! A mock LLM server speaking both the Ollama and the OpenAI chat completions
//! dialects. Classification requests are answered with the same keyword
//! categories as `MockBackend`, so HTTP backends can be tested end to end
//! without a model.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::ai::keyword_response;

/// How the mock server answers completion requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerMode {
    /// Answer with keyword categories
    #[default]
    Normal,
    /// Reply 429 to completion requests
    QuotaExceeded,
    /// Reply 500 to every request
    ServerError,
}

struct ServerState {
    mode: ServerMode,
    requests: Mutex<Vec<Value>>,
}

impl ServerState {
    fn record(&self, body: &Value) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(body.clone());
        }
    }
}

/// Mock LLM server for testing and development
pub struct MockLlmServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockLlmServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::start_with_mode(ServerMode::Normal).await
    }

    /// Start the mock server with a given failure mode
    pub async fn start_with_mode(mode: ServerMode) -> Self {
        let state = Arc::new(ServerState {
            mode,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat_completions))
            .with_state(Arc::clone(&state));

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
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// JSON bodies of completion requests received so far
    pub fn requests(&self) -> Vec<Value> {
        self.state
            .requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockLlmServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Error response for the configured failure mode, if any
fn failure(mode: ServerMode) -> Option<Response> {
    match mode {
        ServerMode::Normal => None,
        ServerMode::QuotaExceeded => Some(
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({"error": {"message": "You exceeded your current quota"}})),
            )
                .into_response(),
        ),
        ServerMode::ServerError => Some(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "model crashed"})),
            )
                .into_response(),
        ),
    }
}

/// Ollama tags endpoint (health check)
async fn handle_tags(State(state): State<Arc<ServerState>>) -> Response {
    if state.mode == ServerMode::ServerError {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(json!({
        "models": [{"name": "llama3.2:latest", "size": 2_000_000_000u64}]
    }))
    .into_response()
}

/// Ollama generate endpoint
async fn handle_generate(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<Value>,
) -> Response {
    state.record(&request);
    if let Some(response) = failure(state.mode) {
        return response;
    }

    let prompt = request["prompt"].as_str().unwrap_or_default();
    Json(json!({
        "model": request["model"],
        "response": keyword_response(prompt),
        "done": true
    }))
    .into_response()
}

/// OpenAI models endpoint (health check)
async fn handle_models(State(state): State<Arc<ServerState>>) -> Response {
    if state.mode == ServerMode::ServerError {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(json!({
        "object": "list",
        "data": [{"id": "gpt-4o-mini", "object": "model"}]
    }))
    .into_response()
}

/// OpenAI chat completions endpoint
async fn handle_chat_completions(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<Value>,
) -> Response {
    state.record(&request);
    if let Some(response) = failure(state.mode) {
        return response;
    }

    let user_prompt = request["messages"]
        .as_array()
        .and_then(|messages| messages.iter().find(|m| m["role"] == "user"))
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default();

    Json(json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "model": request["model"],
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": keyword_response(user_prompt)},
            "finish_reason": "stop"
        }]
    }))
    .into_response()
}
