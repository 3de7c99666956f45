//! Web server — Axum router + shared state.

pub mod api;

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use aas_agent_core::config::Config;
use aas_agent_core::providers::ChatModel;
use aas_agent_core::session::Session;

/// Shared application state — one session per chat id.
pub struct AppState {
    pub sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
    pub config: Config,
    pub model: Arc<dyn ChatModel>,
    pub access_token: String,
}

impl AppState {
    pub fn new(config: Config, model: Arc<dyn ChatModel>, access_token: String) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
            model,
            access_token,
        }
    }

    /// Session for `chat`, created empty on first use.
    pub async fn session(&self, chat: &str) -> Arc<Mutex<Session>> {
        if let Some(s) = self.sessions.read().await.get(chat) {
            return Arc::clone(s);
        }
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(chat.to_string()).or_insert_with(|| {
            info!("New session for chat '{}'", chat);
            Arc::new(Mutex::new(Session::new(&self.config, Arc::clone(&self.model))))
        });
        Arc::clone(session)
    }

    /// Forget `chat`. Returns whether a session existed.
    pub async fn drop_session(&self, chat: &str) -> bool {
        self.sessions.write().await.remove(chat).is_some()
    }
}

/// Reject requests without `Authorization: Bearer <access_token>`.
async fn require_token(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if presented != Some(state.access_token.as_str()) {
        warn!("Unauthorized request to {}", req.uri().path());
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"ok": false, "error": "unauthorized"})),
        )
            .into_response();
    }
    next.run(req).await
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::very_permissive();

    Router::new()
        .merge(api::routes())
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .layer(cors)
        .with_state(state)
}
