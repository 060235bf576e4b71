//! Mock Telegram Bot API server for testing the HTTP client.

#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// A captured API call for assertions.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    /// Bot token taken from the `/bot<token>/` path segment.
    pub token: String,
    /// API method, e.g. `sendMessage`.
    pub method: String,
    pub body: Value,
}

#[derive(Default)]
struct MockState {
    calls: Vec<CapturedCall>,
    responses: VecDeque<Value>,
}

pub struct MockTelegram {
    addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
}

impl MockTelegram {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockState::default()));
        let app = Router::new()
            .route("/{bot}/{method}", post(handle))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock Telegram server");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Queue a raw JSON response; without one, calls get a generic success.
    pub async fn enqueue(&self, response: Value) {
        self.state.lock().await.responses.push_back(response);
    }

    pub async fn calls(&self) -> Vec<CapturedCall> {
        self.state.lock().await.calls.clone()
    }
}

async fn handle(
    State(state): State<Arc<Mutex<MockState>>>,
    Path((bot, method)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut state = state.lock().await;
    state.calls.push(CapturedCall {
        token: bot.trim_start_matches("bot").to_string(),
        method: method.clone(),
        body,
    });

    let response = state.responses.pop_front().unwrap_or_else(|| match method.as_str() {
        "sendMessage" => json!({"ok": true, "result": {"message_id": 1, "chat": {"id": 1}, "date": 0}}),
        "getUpdates" => json!({"ok": true, "result": []}),
        _ => json!({"ok": true, "result": true}),
    });
    Json(response)
}
