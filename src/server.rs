use crate::engine::{MatchEngine, TableSide};
use crate::errors::EngineError;
use crate::store::{append_event_log, persistence_status, save_snapshot};
use crate::types::{ScorePayload, ServerState, TeamPayload};

use axum::{
    extract::State as AxumState,
    response::IntoResponse,
    routing::{get, get_service, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

// ── Router ─────────────────────────────────────────────────────────────

pub fn scoreboard_router(state: ServerState, static_dir: PathBuf) -> Router {
    let static_files = get_service(ServeDir::new(static_dir));

    Router::new()
        .route("/get_data", get(get_data))
        .route("/persistence_status", get(get_persistence_status))
        .route("/add_team", post(add_team))
        .route("/remove_team", post(remove_team))
        .route("/update_score", post(update_score))
        .route("/reset_score", post(reset_score))
        .route("/finish_match", post(finish_match))
        .route("/clear_stats", post(clear_stats))
        .nest_service("/", static_files)
        .with_state(state)
}

// ── Helpers ────────────────────────────────────────────────────────────

/// Lock the engine, apply `op`, and on success persist the snapshot.
/// Engine validation failures and persistence failures both come back as
/// the message the frontend displays; the engine is only mutated when
/// `op` succeeds.
fn mutate_engine<F, R>(state: &ServerState, op: F) -> Result<R, String>
where
    F: FnOnce(&mut MatchEngine) -> Result<R, EngineError>,
{
    let (result, snapshot) = {
        let mut guard = state.engine.lock().map_err(|e| e.to_string())?;
        let result = op(&mut guard).map_err(|e| e.to_string())?;
        (result, guard.snapshot())
    };
    save_snapshot(&state.data_path, &snapshot).map_err(|e| {
        error!("{e}");
        e.to_string()
    })?;
    Ok(result)
}

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

fn failure(message: String) -> Json<Value> {
    Json(json!({ "error": message }))
}

// ── Handlers ───────────────────────────────────────────────────────────

async fn get_data(AxumState(state): AxumState<ServerState>) -> impl IntoResponse {
    let snapshot = {
        let guard = state.engine.lock().unwrap_or_else(|e| e.into_inner());
        guard.snapshot()
    };
    let body = serde_json::to_string(&snapshot).unwrap_or_else(|_| "{}".to_string());
    (
        [
            ("Content-Type", "application/json"),
            ("Cache-Control", "no-store"),
            ("Pragma", "no-cache"),
            ("Expires", "0"),
        ],
        body,
    )
}

async fn get_persistence_status(AxumState(state): AxumState<ServerState>) -> Json<Value> {
    Json(json!(persistence_status(&state.data_path)))
}

async fn add_team(
    AxumState(state): AxumState<ServerState>,
    Json(payload): Json<TeamPayload>,
) -> Json<Value> {
    let name = payload.team.trim().to_string();
    if name.is_empty() {
        return failure("Team name is empty.".to_string());
    }
    match mutate_engine(&state, |engine| engine.add_team(&name)) {
        Ok(()) => {
            info!("team added: {name}");
            success()
        }
        Err(message) => failure(message),
    }
}

async fn remove_team(
    AxumState(state): AxumState<ServerState>,
    Json(payload): Json<TeamPayload>,
) -> Json<Value> {
    let name = payload.team.trim().to_string();
    match mutate_engine(&state, |engine| {
        engine.remove_team(&name);
        Ok(())
    }) {
        Ok(()) => {
            info!("team removed: {name}");
            success()
        }
        Err(message) => failure(message),
    }
}

async fn update_score(
    AxumState(state): AxumState<ServerState>,
    Json(payload): Json<ScorePayload>,
) -> Json<Value> {
    let Some(side) = TableSide::from_number(payload.team) else {
        return failure("Team must be 1 or 2.".to_string());
    };
    match mutate_engine(&state, |engine| {
        engine.adjust_score(side, payload.delta);
        Ok(())
    }) {
        Ok(()) => success(),
        Err(message) => failure(message),
    }
}

async fn reset_score(AxumState(state): AxumState<ServerState>) -> Json<Value> {
    match mutate_engine(&state, |engine| {
        engine.reset_scores();
        Ok(())
    }) {
        Ok(()) => success(),
        Err(message) => failure(message),
    }
}

async fn finish_match(AxumState(state): AxumState<ServerState>) -> Json<Value> {
    match mutate_engine(&state, |engine| engine.finish_match()) {
        Ok(message) => {
            info!("match finished: {message}");
            append_event_log(&state.log_dir, &message);
            Json(json!({ "success": true, "message": message }))
        }
        Err(message) => failure(message),
    }
}

async fn clear_stats(AxumState(state): AxumState<ServerState>) -> Json<Value> {
    match mutate_engine(&state, |engine| {
        engine.reset_all();
        Ok(())
    }) {
        Ok(()) => {
            warn!("full reset: stats, roster, queue, and match cleared");
            append_event_log(&state.log_dir, "full reset");
            success()
        }
        Err(message) => failure(message),
    }
}
