//! Error types for recall-core.

use thiserror::Error;

/// Result type alias using CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors from core type construction.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid rating value {0}, expected 0-5")]
    InvalidRating(u8),
}
