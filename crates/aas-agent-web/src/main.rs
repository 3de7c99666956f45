//! aas-agent-web — Axum web server entry point.
//! Loads config, checks credentials, and serves the chat API.

mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use aas_agent_core::config::Config;
use aas_agent_core::providers::OpenAiCompatible;

use server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let config = match Config::load_from_dir(&project_root) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Refuse to start without credentials rather than fail mid-session
    let missing = config.missing_credentials();
    if !missing.is_empty() {
        for var in &missing {
            eprintln!("❌ Error: {} environment variable not set", var);
        }
        std::process::exit(1);
    }
    let Some(access_token) = config.access_token.clone() else {
        std::process::exit(1);
    };

    let model = OpenAiCompatible::new(&config)?;
    let storage_dir = config.resolve_storage_dir();
    std::fs::create_dir_all(&storage_dir)
        .with_context(|| format!("Failed to create storage dir {}", storage_dir.display()))?;

    info!(
        "provider={} model={} storage={}",
        config.provider,
        config.model,
        storage_dir.display()
    );

    let state = Arc::new(AppState::new(config, Arc::new(model), access_token));
    let app = server::router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);
    let addr = format!("0.0.0.0:{}", port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    eprintln!("  ✅ AAS agent listening on http://localhost:{}\n", port);

    // Graceful shutdown on Ctrl+C
    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    info!("Server stopped.");
    Ok(())
}
