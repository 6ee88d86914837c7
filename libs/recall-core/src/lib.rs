//! Core flashcard library shared by the desktop application.
//!
//! Provides:
//! - SM-2 spaced repetition scheduling (pure, no I/O)
//! - Review priority ordering for presentation
//! - Shared types (Card, Answer, Rating, ReviewSchedule, TagUsage)

pub mod algorithm;
pub mod error;
pub mod types;

pub use algorithm::{review_priority, Sm2};
pub use error::{CoreError, Result};
pub use types::{Answer, AnswerKind, Attachment, Card, Rating, ReviewSchedule, TagUsage};
