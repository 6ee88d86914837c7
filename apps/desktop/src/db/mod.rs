//! Local SQLite persistence.

pub mod date_utils;
pub mod error;
pub mod repository;
pub mod schema;

pub use error::StoreError;
pub use repository::{
    CardStore, DailyStats, ScheduleStore, SqliteRepository, StatsStore, TagStore, WeeklyStats,
};

use std::path::PathBuf;

/// Default database location under the platform data directory.
pub fn default_db_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("recall").join("recall.db"))
}
