//! REST API endpoints for chat commands, free text, and direct operations.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use aas_agent_core::operations;
use aas_agent_core::prompts;

use super::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/start", get(get_start))
        .route("/api/help", get(get_help))
        .route("/api/state", get(get_state))
        .route("/api/tree", get(get_tree))
        .route("/api/reset", post(post_reset))
        .route("/api/message", post(post_message))
        .route("/api/operations", get(list_operations))
        .route("/api/operations/{name}", post(post_operation))
}

#[derive(Deserialize)]
struct ChatQuery {
    chat: Option<String>,
}

impl ChatQuery {
    fn id(&self) -> &str {
        self.chat.as_deref().unwrap_or("default")
    }
}

// --- Fixed texts ---

async fn get_start() -> Json<Value> {
    Json(json!({"text": prompts::WELCOME}))
}

async fn get_help() -> Json<Value> {
    Json(json!({"text": prompts::HELP}))
}

// --- Views ---

async fn get_state(State(state): State<Arc<AppState>>, Query(q): Query<ChatQuery>) -> Json<Value> {
    let session = state.session(q.id()).await;
    let text = session.lock().await.state();
    Json(json!({"chat": q.id(), "text": text}))
}

async fn get_tree(State(state): State<Arc<AppState>>, Query(q): Query<ChatQuery>) -> Json<Value> {
    let session = state.session(q.id()).await;
    let text = session.lock().await.tree();
    Json(json!({"chat": q.id(), "text": text}))
}

// --- Reset ---

async fn post_reset(State(state): State<Arc<AppState>>, Query(q): Query<ChatQuery>) -> Json<Value> {
    if state.drop_session(q.id()).await {
        info!("Chat '{}' reset", q.id());
    }
    Json(json!({"ok": true, "text": prompts::RESET_DONE}))
}

// --- Message ---

#[derive(Deserialize)]
struct MessageBody {
    text: Option<String>,
}

async fn post_message(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ChatQuery>,
    Json(body): Json<MessageBody>,
) -> Json<Value> {
    let text = match body.text.as_deref().map(|s| s.trim()) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => return Json(json!({"ok": false, "error": "empty message"})),
    };

    info!("Message for chat '{}': {}", q.id(), text);
    let session = state.session(q.id()).await;
    let reply = session.lock().await.process_message(&text).await;
    Json(json!({"ok": true, "reply": reply}))
}

// --- Operations ---

async fn list_operations() -> Json<Value> {
    let list: Vec<Value> = operations::catalog()
        .into_iter()
        .map(|op| {
            json!({
                "name": op.name,
                "description": op.description,
                "parameters": op.parameters,
            })
        })
        .collect();
    Json(json!(list))
}

async fn post_operation(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ChatQuery>,
    Path(name): Path<String>,
    body: Bytes,
) -> Json<Value> {
    let args: Value = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(e) => return Json(json!({"ok": false, "error": format!("invalid JSON body: {}", e)})),
        }
    };

    let session = state.session(q.id()).await;
    let result = session.lock().await.dispatch(&name, &args);
    Json(json!({"ok": !result.starts_with("❌"), "result": result}))
}
