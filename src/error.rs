use thiserror::Error;

use crate::store::{SessionId, SongId, TechniqueId};

/// A request was rejected before anything changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a practice date is required")]
    MissingDate,
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("duration must be at least 1 minute, got {0}")]
    NonPositiveDuration(i64),
    #[error("duration {0} is too large")]
    DurationOutOfRange(i64),
    #[error("unknown technique id {0}")]
    UnknownTechnique(TechniqueId),
    #[error("unknown song id {0}")]
    UnknownSong(SongId),
    #[error("name must not be blank")]
    BlankName,
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("session {0} not found")]
    NotFound(SessionId),
    #[error("no session is waiting for delete confirmation")]
    NoPendingDelete,
}

/// Storage could not be written. In-memory state stays authoritative.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
