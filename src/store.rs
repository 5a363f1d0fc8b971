use crate::errors::StoreError;
use crate::types::{
  AppConfig, EngineSnapshot, PersistenceStatus, DATA_FILE_NAME, DEFAULT_BIND_ADDR,
  DEFAULT_LOG_DIR, DEFAULT_STATIC_DIR,
};
use chrono::Local;
use std::{
  env,
  fs,
  io::Write,
  path::{Path, PathBuf},
  time::UNIX_EPOCH,
};

pub fn repo_root() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn resolve_repo_path(raw: &str) -> PathBuf {
  let path = PathBuf::from(raw);
  if path.is_absolute() {
    path
  } else {
    repo_root().join(path)
  }
}

pub fn config_path() -> PathBuf {
  repo_root().join("config.json")
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

pub fn apply_env_defaults(mut config: AppConfig) -> AppConfig {
  if config.bind_addr.trim().is_empty() {
    if let Some(value) = env_default("SCOREBOARD_BIND") {
      config.bind_addr = value;
    }
  }
  if config.data_path.trim().is_empty() {
    if let Some(value) = env_default("SCOREBOARD_DATA_PATH") {
      config.data_path = value;
    }
  }
  if config.static_dir.trim().is_empty() {
    if let Some(value) = env_default("SCOREBOARD_STATIC_DIR") {
      config.static_dir = value;
    }
  }
  if config.log_dir.trim().is_empty() {
    if let Some(value) = env_default("SCOREBOARD_LOG_DIR") {
      config.log_dir = value;
    }
  }
  config
}

pub fn load_config_inner() -> Result<AppConfig, String> {
  let path = config_path();
  if !path.is_file() {
    return Ok(apply_env_defaults(AppConfig::default()));
  }
  let data = fs::read_to_string(&path).map_err(|e| format!("read config {}: {e}", path.display()))?;
  let config = serde_json::from_str::<AppConfig>(&data)
    .map_err(|e| format!("parse config {}: {e}", path.display()))?;
  Ok(apply_env_defaults(config))
}

pub fn resolved_bind_addr(config: &AppConfig) -> String {
  let raw = config.bind_addr.trim();
  if raw.is_empty() {
    DEFAULT_BIND_ADDR.to_string()
  } else {
    raw.to_string()
  }
}

pub fn resolved_data_path(config: &AppConfig) -> PathBuf {
  let raw = config.data_path.trim();
  if raw.is_empty() {
    repo_root().join(DATA_FILE_NAME)
  } else {
    resolve_repo_path(raw)
  }
}

pub fn resolved_static_dir(config: &AppConfig) -> PathBuf {
  let raw = config.static_dir.trim();
  if raw.is_empty() {
    repo_root().join(DEFAULT_STATIC_DIR)
  } else {
    resolve_repo_path(raw)
  }
}

pub fn resolved_log_dir(config: &AppConfig) -> PathBuf {
  let raw = config.log_dir.trim();
  if raw.is_empty() {
    repo_root().join(DEFAULT_LOG_DIR)
  } else {
    resolve_repo_path(raw)
  }
}

pub fn load_env_file() {
  let env_path = repo_root().join(".env");
  if !env_path.is_file() {
    return;
  }
  let contents = match fs::read_to_string(&env_path) {
    Ok(data) => data,
    Err(_) => return,
  };
  for line in contents.lines() {
    if let Some((key, value)) = parse_env_line(line) {
      if env::var_os(&key).is_none() {
        env::set_var(key, value);
      }
    }
  }
}

pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let trimmed = line.trim();
  if trimmed.is_empty() || trimmed.starts_with('#') {
    return None;
  }
  let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
  let (key, raw_value) = trimmed.split_once('=')?;
  let key = key.trim();
  if key.is_empty() {
    return None;
  }
  let mut value = raw_value.trim();
  if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if let Some(idx) = value.find('#') {
    value = value[..idx].trim_end();
  }
  Some((key.to_string(), value.to_string()))
}

// ── Snapshot persistence ───────────────────────────────────────────────

/// Load the persisted snapshot, or the default empty state when no file
/// exists yet. Fields missing from older snapshots are backfilled by the
/// serde defaults on the snapshot types.
pub fn load_snapshot(path: &Path) -> Result<EngineSnapshot, StoreError> {
  if !path.is_file() {
    return Ok(EngineSnapshot::default());
  }
  let data = fs::read_to_string(path).map_err(|e| StoreError::Read {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;
  serde_json::from_str(&data).map_err(|e| StoreError::Parse {
    path: path.display().to_string(),
    message: e.to_string(),
  })
}

/// Overwrite the snapshot file wholesale.
pub fn save_snapshot(path: &Path, snapshot: &EngineSnapshot) -> Result<(), StoreError> {
  let payload = serde_json::to_string_pretty(snapshot).map_err(|e| StoreError::Write {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;
  fs::write(path, payload).map_err(|e| StoreError::Write {
    path: path.display().to_string(),
    message: e.to_string(),
  })
}

pub fn persistence_status(path: &Path) -> PersistenceStatus {
  let last_saved_ms = fs::metadata(path)
    .and_then(|meta| meta.modified())
    .ok()
    .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
    .map(|duration| duration.as_millis() as u64);
  PersistenceStatus {
    path: path.display().to_string(),
    exists: path.is_file(),
    last_saved_ms,
  }
}

// ── Event log ──────────────────────────────────────────────────────────

/// Append a timestamped line to the plain-text event log. Diagnostic
/// only; failures are swallowed so logging never blocks a command.
pub fn append_event_log(log_dir: &Path, entry: &str) {
  if fs::create_dir_all(log_dir).is_err() {
    return;
  }
  let path = log_dir.join("match_events.log");
  let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
  let line = format!("[{timestamp}] {entry}\n");
  if let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(&path) {
    let _ = file.write_all(line.as_bytes());
  }
}
