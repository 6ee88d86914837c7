//! Storage error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt stored record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("card not found: {0}")]
    CardNotFound(String),

    #[error("schedule not found for card: {0}")]
    ScheduleNotFound(String),

    #[error("schedule already exists for card: {0}")]
    ScheduleExists(String),

    #[error("invalid data: {0}")]
    Validation(String),
}
