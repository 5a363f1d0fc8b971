pub mod engine;
pub mod errors;
pub mod server;
pub mod store;
pub mod types;

use engine::MatchEngine;
use server::scoreboard_router;
use store::*;
use types::*;

use std::{
    fs,
    sync::{Arc, Mutex},
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ── Entry point ────────────────────────────────────────────────────────

pub async fn run() -> Result<(), String> {
    load_env_file();
    let config = load_config_inner()?;

    // Initialize tracing with file + stderr output
    let log_dir = resolved_log_dir(&config);
    fs::create_dir_all(&log_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    info!("Table King scoreboard starting");

    let data_path = resolved_data_path(&config);
    let snapshot = load_snapshot(&data_path).map_err(|e| e.to_string())?;
    if data_path.is_file() {
        info!("loaded scoreboard state from {}", data_path.display());
    } else {
        info!("no saved state at {}, starting fresh", data_path.display());
    }
    let engine: SharedEngine = Arc::new(Mutex::new(MatchEngine::from_snapshot(snapshot)));

    let static_dir = resolved_static_dir(&config);
    fs::create_dir_all(&static_dir).ok();

    let state = ServerState {
        engine,
        data_path,
        log_dir,
    };
    let app = scoreboard_router(state, static_dir);

    let addr = resolved_bind_addr(&config);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("bind {addr}: {e}"))?;
    info!("scoreboard server listening at http://{addr}/");
    axum::serve(listener, app).await.map_err(|e| e.to_string())
}
