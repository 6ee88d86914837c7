//! Core types for the flashcard application.
//!
//! JSON field names are camelCase so card data round-trips with the
//! export format of earlier application versions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Self-assessed recall quality for one review, 0 (blackout) to 5 (perfect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Rating {
    Blackout,
    Wrong,
    Hard,
    Good,
    Easy,
    Perfect,
}

impl Rating {
    /// Numeric value (0-5).
    pub fn value(self) -> u8 {
        match self {
            Self::Blackout => 0,
            Self::Wrong => 1,
            Self::Hard => 2,
            Self::Good => 3,
            Self::Easy => 4,
            Self::Perfect => 5,
        }
    }

    /// A rating of 3 or better counts as a successful recall.
    pub fn is_pass(self) -> bool {
        self.value() >= 3
    }
}

impl TryFrom<u8> for Rating {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Blackout),
            1 => Ok(Self::Wrong),
            2 => Ok(Self::Hard),
            3 => Ok(Self::Good),
            4 => Ok(Self::Easy),
            5 => Ok(Self::Perfect),
            other => Err(CoreError::InvalidRating(other)),
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> u8 {
        rating.value()
    }
}

/// Answer content kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerKind {
    Text,
    Markdown,
    Audio,
    Image,
    Mixed,
}

impl Default for AnswerKind {
    fn default() -> Self {
        Self::Text
    }
}

/// File attached to an answer (image, recording, markdown file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    /// MIME type.
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Base64-encoded payload.
    pub data: String,
    /// Size in bytes.
    pub size: u64,
}

/// Answer side of a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    #[serde(rename = "type")]
    pub kind: AnswerKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

impl Answer {
    /// Plain text answer.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: AnswerKind::Text,
            content: content.into(),
            attachments: None,
        }
    }
}

/// A question/answer card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub question: String,
    pub answer: Answer,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-card review schedule, keyed 1:1 by card id.
///
/// The card id is a plain lookup key, never an embedded reference, so
/// deletion and serialization stay simple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSchedule {
    pub card_id: String,
    /// When the card next becomes eligible for review.
    pub due_date: DateTime<Utc>,
    /// Days until the next due date after a good review.
    pub interval: u32,
    /// Consecutive qualifying reviews since the last reset.
    pub repetitions: u32,
    pub ease_factor: f64,
    /// One rating per completed review, oldest first.
    pub performance_history: Vec<Rating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<DateTime<Utc>>,
}

impl ReviewSchedule {
    /// State for a card that has never been reviewed: due immediately.
    pub fn initial(card_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            card_id: card_id.into(),
            due_date: now,
            interval: 1,
            repetitions: 0,
            ease_factor: 2.5,
            performance_history: Vec::new(),
            last_reviewed: None,
        }
    }
}

/// Usage record for one normalized tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagUsage {
    /// Tag name, trimmed and lower-cased (the cache key).
    pub tag: String,
    pub count: u32,
    pub last_used: DateTime<Utc>,
}
