//! SQLite schema.
//!
//! Timestamps are stored as UTC RFC 3339 strings, which sort the same
//! as the instants they represent, so the timestamp indexes support
//! range queries directly.

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cards (
    id TEXT PRIMARY KEY,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,       -- Answer as JSON
    tags TEXT NOT NULL,         -- JSON array of strings
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cards_created_at ON cards(created_at);

CREATE TABLE IF NOT EXISTS review_schedules (
    card_id TEXT PRIMARY KEY,
    due_date TEXT NOT NULL,
    interval_days INTEGER NOT NULL,
    repetitions INTEGER NOT NULL,
    ease_factor REAL NOT NULL,
    performance_history TEXT NOT NULL,  -- JSON array of 0-5 ratings
    last_reviewed TEXT
);

CREATE INDEX IF NOT EXISTS idx_schedules_due_date ON review_schedules(due_date);
CREATE INDEX IF NOT EXISTS idx_schedules_last_reviewed ON review_schedules(last_reviewed);

CREATE TABLE IF NOT EXISTS tag_usages (
    tag TEXT PRIMARY KEY,
    count INTEGER NOT NULL,
    last_used TEXT NOT NULL
);
";
