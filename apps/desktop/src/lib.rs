//! Local application core for the recall flashcard app.
//!
//! Owns persistence (SQLite), the tag usage cache, and the card
//! service that ties card edits and reviews to the scheduling engine
//! in `recall-core`. The UI layer calls into [`service::CardService`].

pub mod db;
pub mod service;
pub mod tags;

pub use db::{DailyStats, SqliteRepository, StoreError, WeeklyStats};
pub use service::{CardService, CreateCardInput, LearningStats, UpdateCardInput};
pub use tags::TagUsageCache;
