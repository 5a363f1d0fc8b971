use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use crate::engine::MatchEngine;

// ── Constants ──────────────────────────────────────────────────────────

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DATA_FILE_NAME: &str = "scoreboard_data.json";
pub const DEFAULT_STATIC_DIR: &str = "web";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Winner stays indefinitely while the roster has at most this many teams.
pub const WINNER_STAYS_ROSTER_MAX: usize = 3;
/// Consecutive wins that send the winner to the queue on a larger roster.
pub const ROTATE_OUT_STREAK: u32 = 2;

// ── Shared state type aliases ──────────────────────────────────────────

pub type SharedEngine = Arc<Mutex<MatchEngine>>;

// ── Snapshot wire types ────────────────────────────────────────────────

/// Current-match block of the persisted snapshot. Field names match the
/// legacy scoreboard_data.json layout; every field defaults so snapshots
/// written before streak tracking existed still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSnapshot {
    pub team1: String,
    pub team2: String,
    pub score1: u32,
    pub score2: u32,
    pub team1_streak: u32,
    pub team2_streak: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamRecord {
    pub wins: u32,
    pub losses: u32,
}

/// Whole-engine snapshot: the unit of persistence and the payload of the
/// read-only state endpoint. An empty string in team1/team2 means the
/// slot is unoccupied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSnapshot {
    pub current_match: MatchSnapshot,
    pub queue: Vec<String>,
    pub all_teams: Vec<String>,
    pub stats: HashMap<String, TeamRecord>,
}

// ── Config types ───────────────────────────────────────────────────────

/// Empty fields fall back to env vars, then to the built-in defaults;
/// see the resolved_* helpers in store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub data_path: String,
    pub static_dir: String,
    pub log_dir: String,
}

// ── Server types ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ServerState {
    pub engine: SharedEngine,
    pub data_path: PathBuf,
    pub log_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamPayload {
    pub team: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScorePayload {
    pub team: u8,
    pub delta: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceStatus {
    pub path: String,
    pub exists: bool,
    pub last_saved_ms: Option<u64>,
}
