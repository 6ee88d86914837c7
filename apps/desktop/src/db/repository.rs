//! Repository pattern for database access.
//!
//! Cards, review schedules, and tag usages live in separate tables
//! linked by id, never by embedded reference. Aggregate statistics are
//! recomputed from current data on every call; nothing is maintained
//! incrementally.

use crate::db::date_utils::{day_range, week_range};
use crate::db::error::StoreError;
use chrono::{DateTime, Duration, Local, Utc};
use recall_core::types::{Card, ReviewSchedule, TagUsage};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

type Result<T> = std::result::Result<T, StoreError>;

/// Repository for card operations.
pub trait CardStore {
    fn insert_card(&self, card: &Card) -> Result<()>;
    fn get_card(&self, id: &str) -> Result<Option<Card>>;
    /// Update an existing card. Fails with `CardNotFound` for unknown ids.
    fn put_card(&self, card: &Card) -> Result<()>;
    fn all_cards(&self) -> Result<Vec<Card>>;
    fn cards_created_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<usize>;
    /// Remove a card and its schedule in one transaction.
    fn delete_card_with_schedule(&self, id: &str) -> Result<()>;
}

/// Repository for review schedule operations.
pub trait ScheduleStore {
    /// Create the initial schedule for a card: due immediately,
    /// interval 1, no history. Fails with `ScheduleExists` if the card
    /// already has one.
    fn init_schedule(&self, card_id: &str, now: DateTime<Utc>) -> Result<ReviewSchedule>;
    fn get_schedule(&self, card_id: &str) -> Result<Option<ReviewSchedule>>;
    fn save_schedule(&self, schedule: &ReviewSchedule) -> Result<()>;
    /// Schedules with `due_date <= now`, via the due-date index.
    fn due_schedules(&self, now: DateTime<Utc>) -> Result<Vec<ReviewSchedule>>;
    fn all_schedules(&self) -> Result<Vec<ReviewSchedule>>;
}

/// Per-day statistics point.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    /// Local calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub new_cards: usize,
    pub reviews_completed: usize,
    pub average_rating: f64,
}

/// Current-week statistics (Monday through Sunday, local time).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub new_cards: usize,
    pub reviews_completed: usize,
    pub average_rating: f64,
}

/// Repository for aggregate statistics.
pub trait StatsStore {
    /// Reviews completed during the local calendar day of `now`.
    fn completed_today_count(&self, now: DateTime<Local>) -> Result<usize>;
    /// Share of historical ratings that were passes (>= 3), as a
    /// percentage rounded to one decimal. Zero with no history.
    fn retention_rate(&self) -> Result<f64>;
    /// One point per local calendar day for the last `days` days,
    /// oldest first, today included.
    fn daily_stats(&self, days: u32, now: DateTime<Local>) -> Result<Vec<DailyStats>>;
    fn weekly_stats(&self, now: DateTime<Local>) -> Result<WeeklyStats>;
}

/// Persistence port for the tag usage cache.
pub trait TagStore {
    fn get_tag_usage(&self, tag: &str) -> Result<Option<TagUsage>>;
    fn put_tag_usage(&self, usage: &TagUsage) -> Result<()>;
    fn delete_tag_usage(&self, tag: &str) -> Result<()>;
    fn all_tag_usages(&self) -> Result<Vec<TagUsage>>;
    fn tag_count(&self) -> Result<usize>;
}

/// SQLite implementation of the stores.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open database at path, creating it if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(super::schema::SCHEMA)?;
        Ok(())
    }

    fn schedules_reviewed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ReviewSchedule>> {
        let mut stmt = self.conn.prepare(
            "SELECT card_id, due_date, interval_days, repetitions, ease_factor, performance_history, last_reviewed
             FROM review_schedules
             WHERE last_reviewed >= ?1 AND last_reviewed < ?2",
        )?;
        let rows = stmt
            .query_map(params![start.to_rfc3339(), end.to_rfc3339()], ScheduleRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(ScheduleRow::into_schedule).collect()
    }
}

impl CardStore for SqliteRepository {
    fn insert_card(&self, card: &Card) -> Result<()> {
        self.conn.execute(
            "INSERT INTO cards (id, question, answer, tags, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                card.id,
                card.question,
                serde_json::to_string(&card.answer)?,
                serde_json::to_string(&card.tags)?,
                card.created_at.to_rfc3339(),
                card.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_card(&self, id: &str) -> Result<Option<Card>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, question, answer, tags, created_at, updated_at FROM cards WHERE id = ?1",
                params![id],
                CardRow::from_row,
            )
            .optional()?;
        row.map(CardRow::into_card).transpose()
    }

    fn put_card(&self, card: &Card) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE cards SET question = ?2, answer = ?3, tags = ?4, created_at = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                card.id,
                card.question,
                serde_json::to_string(&card.answer)?,
                serde_json::to_string(&card.tags)?,
                card.created_at.to_rfc3339(),
                card.updated_at.to_rfc3339(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::CardNotFound(card.id.clone()));
        }
        Ok(())
    }

    fn all_cards(&self) -> Result<Vec<Card>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, question, answer, tags, created_at, updated_at FROM cards ORDER BY created_at",
        )?;
        let rows = stmt
            .query_map([], CardRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(CardRow::into_card).collect()
    }

    fn cards_created_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<usize> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM cards WHERE created_at >= ?1 AND created_at < ?2",
            params![start.to_rfc3339(), end.to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn delete_card_with_schedule(&self, id: &str) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM cards WHERE id = ?1", params![id])?;
        if removed == 0 {
            // Dropping the transaction rolls back.
            return Err(StoreError::CardNotFound(id.to_string()));
        }
        tx.execute(
            "DELETE FROM review_schedules WHERE card_id = ?1",
            params![id],
        )?;
        tx.commit()?;
        Ok(())
    }
}

impl ScheduleStore for SqliteRepository {
    fn init_schedule(&self, card_id: &str, now: DateTime<Utc>) -> Result<ReviewSchedule> {
        if self.get_schedule(card_id)?.is_some() {
            return Err(StoreError::ScheduleExists(card_id.to_string()));
        }
        let schedule = ReviewSchedule::initial(card_id, now);
        self.save_schedule(&schedule)?;
        Ok(schedule)
    }

    fn get_schedule(&self, card_id: &str) -> Result<Option<ReviewSchedule>> {
        let row = self
            .conn
            .query_row(
                "SELECT card_id, due_date, interval_days, repetitions, ease_factor, performance_history, last_reviewed
                 FROM review_schedules WHERE card_id = ?1",
                params![card_id],
                ScheduleRow::from_row,
            )
            .optional()?;
        row.map(ScheduleRow::into_schedule).transpose()
    }

    fn save_schedule(&self, schedule: &ReviewSchedule) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO review_schedules
             (card_id, due_date, interval_days, repetitions, ease_factor, performance_history, last_reviewed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                schedule.card_id,
                schedule.due_date.to_rfc3339(),
                schedule.interval,
                schedule.repetitions,
                schedule.ease_factor,
                serde_json::to_string(&schedule.performance_history)?,
                schedule.last_reviewed.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    fn due_schedules(&self, now: DateTime<Utc>) -> Result<Vec<ReviewSchedule>> {
        let mut stmt = self.conn.prepare(
            "SELECT card_id, due_date, interval_days, repetitions, ease_factor, performance_history, last_reviewed
             FROM review_schedules
             WHERE due_date <= ?1
             ORDER BY due_date",
        )?;
        let rows = stmt
            .query_map(params![now.to_rfc3339()], ScheduleRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(ScheduleRow::into_schedule).collect()
    }

    fn all_schedules(&self) -> Result<Vec<ReviewSchedule>> {
        let mut stmt = self.conn.prepare(
            "SELECT card_id, due_date, interval_days, repetitions, ease_factor, performance_history, last_reviewed
             FROM review_schedules",
        )?;
        let rows = stmt
            .query_map([], ScheduleRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(ScheduleRow::into_schedule).collect()
    }
}

impl StatsStore for SqliteRepository {
    fn completed_today_count(&self, now: DateTime<Local>) -> Result<usize> {
        let (start, end) = day_range(now.date_naive());
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM review_schedules WHERE last_reviewed >= ?1 AND last_reviewed < ?2",
            params![start.to_rfc3339(), end.to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn retention_rate(&self) -> Result<f64> {
        let mut total = 0usize;
        let mut passes = 0usize;
        for schedule in self.all_schedules()? {
            total += schedule.performance_history.len();
            passes += schedule
                .performance_history
                .iter()
                .filter(|r| r.is_pass())
                .count();
        }
        if total == 0 {
            return Ok(0.0);
        }
        let rate = passes as f64 / total as f64 * 100.0;
        Ok((rate * 10.0).round() / 10.0)
    }

    fn daily_stats(&self, days: u32, now: DateTime<Local>) -> Result<Vec<DailyStats>> {
        let today = now.date_naive();
        let mut stats = Vec::with_capacity(days as usize);

        for offset in (0..days as i64).rev() {
            let day = today - Duration::days(offset);
            let (start, end) = day_range(day);

            let new_cards = self.cards_created_between(start, end)?;
            let reviewed = self.schedules_reviewed_between(start, end)?;
            let average_rating = average_last_rating(&reviewed);

            stats.push(DailyStats {
                date: day.format("%Y-%m-%d").to_string(),
                new_cards,
                reviews_completed: reviewed.len(),
                average_rating,
            });
        }

        Ok(stats)
    }

    fn weekly_stats(&self, now: DateTime<Local>) -> Result<WeeklyStats> {
        let (start, end) = week_range(now);
        let new_cards = self.cards_created_between(start, end)?;
        let reviewed = self.schedules_reviewed_between(start, end)?;

        Ok(WeeklyStats {
            new_cards,
            reviews_completed: reviewed.len(),
            average_rating: average_last_rating(&reviewed),
        })
    }
}

/// Mean of each reviewed schedule's most recent rating, one decimal.
fn average_last_rating(schedules: &[ReviewSchedule]) -> f64 {
    let ratings: Vec<u8> = schedules
        .iter()
        .filter_map(|s| s.performance_history.last().map(|r| r.value()))
        .collect();
    if ratings.is_empty() {
        return 0.0;
    }
    let mean = ratings.iter().map(|&r| r as f64).sum::<f64>() / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}

impl TagStore for SqliteRepository {
    fn get_tag_usage(&self, tag: &str) -> Result<Option<TagUsage>> {
        let row = self
            .conn
            .query_row(
                "SELECT tag, count, last_used FROM tag_usages WHERE tag = ?1",
                params![tag],
                TagRow::from_row,
            )
            .optional()?;
        row.map(TagRow::into_usage).transpose()
    }

    fn put_tag_usage(&self, usage: &TagUsage) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO tag_usages (tag, count, last_used) VALUES (?1, ?2, ?3)",
            params![usage.tag, usage.count, usage.last_used.to_rfc3339()],
        )?;
        Ok(())
    }

    fn delete_tag_usage(&self, tag: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM tag_usages WHERE tag = ?1", params![tag])?;
        Ok(())
    }

    fn all_tag_usages(&self) -> Result<Vec<TagUsage>> {
        let mut stmt = self
            .conn
            .prepare("SELECT tag, count, last_used FROM tag_usages")?;
        let rows = stmt
            .query_map([], TagRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(TagRow::into_usage).collect()
    }

    fn tag_count(&self) -> Result<usize> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM tag_usages", [], |row| row.get(0))?;
        Ok(count)
    }
}

struct CardRow {
    id: String,
    question: String,
    answer: String,
    tags: String,
    created_at: String,
    updated_at: String,
}

impl CardRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            question: row.get(1)?,
            answer: row.get(2)?,
            tags: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_card(self) -> Result<Card> {
        Ok(Card {
            id: self.id,
            question: self.question,
            answer: serde_json::from_str(&self.answer)?,
            tags: serde_json::from_str(&self.tags)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

struct ScheduleRow {
    card_id: String,
    due_date: String,
    interval: u32,
    repetitions: u32,
    ease_factor: f64,
    performance_history: String,
    last_reviewed: Option<String>,
}

impl ScheduleRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            card_id: row.get(0)?,
            due_date: row.get(1)?,
            interval: row.get(2)?,
            repetitions: row.get(3)?,
            ease_factor: row.get(4)?,
            performance_history: row.get(5)?,
            last_reviewed: row.get(6)?,
        })
    }

    fn into_schedule(self) -> Result<ReviewSchedule> {
        Ok(ReviewSchedule {
            card_id: self.card_id,
            due_date: parse_timestamp(&self.due_date)?,
            interval: self.interval,
            repetitions: self.repetitions,
            ease_factor: self.ease_factor,
            performance_history: serde_json::from_str(&self.performance_history)?,
            last_reviewed: self.last_reviewed.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

struct TagRow {
    tag: String,
    count: u32,
    last_used: String,
}

impl TagRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            tag: row.get(0)?,
            count: row.get(1)?,
            last_used: row.get(2)?,
        })
    }

    fn into_usage(self) -> Result<TagUsage> {
        Ok(TagUsage {
            tag: self.tag,
            count: self.count,
            last_used: parse_timestamp(&self.last_used)?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Validation(format!("bad timestamp {value}: {e}")))
}
