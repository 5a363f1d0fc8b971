//! Error types for the match engine and snapshot store.

use thiserror::Error;

/// Recoverable validation failures from engine operations. The display
/// text is the message the frontend shows; engine state is unchanged
/// whenever one of these comes back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Team already exists")]
    DuplicateTeam,

    #[error("Need at least 2 teams playing to finish a match")]
    IncompleteMatch,

    #[error("Cannot finish match with a tie. Please adjust scores.")]
    TiedScore,
}

/// Snapshot persistence failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("read snapshot {path}: {message}")]
    Read { path: String, message: String },

    #[error("parse snapshot {path}: {message}")]
    Parse { path: String, message: String },

    #[error("write snapshot {path}: {message}")]
    Write { path: String, message: String },
}
