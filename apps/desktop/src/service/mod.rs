//! Card service: the orchestration layer exposed to the UI.
//!
//! Ties card edits and review events to the scheduling engine, the
//! repository, and the tag usage cache. Primary reads and all writes
//! surface errors to the caller; secondary statistics reads degrade to
//! zeroed aggregates instead of failing the whole screen.

use chrono::{DateTime, Local, Utc};
use recall_core::algorithm::{review_priority, Sm2};
use recall_core::types::{Answer, Card, Rating, ReviewSchedule};
use recall_core::TagUsage;
use uuid::Uuid;

use crate::db::{
    CardStore, DailyStats, ScheduleStore, SqliteRepository, StatsStore, StoreError, WeeklyStats,
};
use crate::tags::TagUsageCache;

type Result<T> = std::result::Result<T, StoreError>;

/// Input for creating a card.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardInput {
    pub question: String,
    pub answer: Answer,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update for an existing card.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardInput {
    pub question: Option<String>,
    pub answer: Option<Answer>,
    pub tags: Option<Vec<String>>,
}

/// Dashboard summary.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStats {
    pub daily_review_count: usize,
    pub retention_rate: f64,
    pub total_cards: usize,
    pub due_cards: usize,
    pub weekly_progress: WeeklyStats,
}

/// Orchestrates card lifecycle, reviews, statistics, and tags.
pub struct CardService {
    repo: SqliteRepository,
    tags: TagUsageCache,
    sm2: Sm2,
}

impl CardService {
    pub fn new(repo: SqliteRepository) -> Self {
        Self {
            repo,
            tags: TagUsageCache::default(),
            sm2: Sm2::default(),
        }
    }

    /// Create a card and its initial schedule, and record tag usage.
    pub fn create_card(&self, input: CreateCardInput) -> Result<Card> {
        validate(&input.question, &input.answer)?;

        let now = Utc::now();
        let card = Card {
            id: Uuid::new_v4().to_string(),
            question: input.question,
            answer: input.answer,
            tags: input.tags,
            created_at: now,
            updated_at: now,
        };
        self.repo.insert_card(&card)?;
        self.repo.init_schedule(&card.id, now)?;
        self.tags.use_tags(&self.repo, &card.tags, now)?;

        tracing::info!(card_id = %card.id, "card created");
        Ok(card)
    }

    /// Apply a partial update. Fails with `CardNotFound` for unknown ids.
    pub fn update_card(&self, id: &str, input: UpdateCardInput) -> Result<Card> {
        let mut card = self.get_card(id)?;
        let now = Utc::now();

        if let Some(question) = input.question {
            card.question = question;
        }
        if let Some(answer) = input.answer {
            card.answer = answer;
        }
        let tags_changed = input.tags.is_some();
        if let Some(tags) = input.tags {
            card.tags = tags;
        }
        validate(&card.question, &card.answer)?;
        card.updated_at = now;

        self.repo.put_card(&card)?;
        if tags_changed {
            self.tags.use_tags(&self.repo, &card.tags, now)?;
        }
        Ok(card)
    }

    /// Remove a card and its schedule; neither outlives the other.
    pub fn delete_card(&self, id: &str) -> Result<()> {
        self.repo.delete_card_with_schedule(id)?;
        tracing::info!(card_id = %id, "card deleted");
        Ok(())
    }

    pub fn get_card(&self, id: &str) -> Result<Card> {
        self.repo
            .get_card(id)?
            .ok_or_else(|| StoreError::CardNotFound(id.to_string()))
    }

    pub fn all_cards(&self) -> Result<Vec<Card>> {
        self.repo.all_cards()
    }

    /// Cards whose question, answer content, or tags contain `query`,
    /// case-insensitively.
    pub fn search_cards(&self, query: &str) -> Result<Vec<Card>> {
        let query = query.to_lowercase();
        let mut cards = self.repo.all_cards()?;
        cards.retain(|card| {
            card.question.to_lowercase().contains(&query)
                || card.answer.content.to_lowercase().contains(&query)
                || card.tags.iter().any(|t| t.to_lowercase().contains(&query))
        });
        Ok(cards)
    }

    /// Record a self-assessed review and persist the updated schedule.
    ///
    /// A card without a stored schedule is reviewed from the initial
    /// state (fresh cards are immediately reviewable).
    pub fn record_review(&self, card_id: &str, rating: Rating) -> Result<ReviewSchedule> {
        // The card must exist even if its schedule is missing.
        let card = self.get_card(card_id)?;
        let now = Utc::now();

        let current = match self.repo.get_schedule(card_id)? {
            Some(schedule) => schedule,
            None => ReviewSchedule::initial(&card.id, now),
        };
        let next = self.sm2.schedule(&current, rating, now);
        self.repo.save_schedule(&next)?;

        tracing::info!(
            card_id = %card_id,
            rating = rating.value(),
            interval = next.interval,
            "review recorded"
        );
        Ok(next)
    }

    /// Due cards, most urgent first.
    pub fn due_cards(&self) -> Result<Vec<Card>> {
        let now = Utc::now();
        let mut due = self.repo.due_schedules(now)?;
        due.sort_by_key(|schedule| std::cmp::Reverse(review_priority(schedule, now)));

        let mut cards = Vec::with_capacity(due.len());
        for schedule in due {
            // A schedule without a card indicates a torn delete; skip it.
            if let Some(card) = self.repo.get_card(&schedule.card_id)? {
                cards.push(card);
            }
        }
        Ok(cards)
    }

    pub fn completed_today_count(&self) -> usize {
        self.degraded(|| self.repo.completed_today_count(Local::now()), 0)
    }

    pub fn retention_rate(&self) -> f64 {
        self.degraded(|| self.repo.retention_rate(), 0.0)
    }

    pub fn weekly_stats(&self) -> WeeklyStats {
        self.degraded(|| self.repo.weekly_stats(Local::now()), WeeklyStats::default())
    }

    pub fn daily_stats(&self, days: u32) -> Vec<DailyStats> {
        self.degraded(|| self.repo.daily_stats(days, Local::now()), Vec::new())
    }

    /// Dashboard summary; degrades field by field rather than failing.
    pub fn dashboard_stats(&self) -> LearningStats {
        LearningStats {
            daily_review_count: self.completed_today_count(),
            retention_rate: self.retention_rate(),
            total_cards: self.degraded(|| Ok(self.repo.all_cards()?.len()), 0),
            due_cards: self.degraded(|| Ok(self.repo.due_schedules(Utc::now())?.len()), 0),
            weekly_progress: self.weekly_stats(),
        }
    }

    /// Stored schedule for a card, with an explicit not-found signal.
    pub fn get_schedule(&self, card_id: &str) -> Result<ReviewSchedule> {
        self.repo
            .get_schedule(card_id)?
            .ok_or_else(|| StoreError::ScheduleNotFound(card_id.to_string()))
    }

    pub fn record_tag_use(&self, tag: &str) -> Result<()> {
        self.tags.use_tag(&self.repo, tag, Utc::now())
    }

    pub fn record_tag_uses<I, S>(&self, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.use_tags(&self.repo, tags, Utc::now())
    }

    /// Ranked autocomplete suggestions for a partial tag.
    pub fn tag_suggestions(&self, query: &str, limit: usize) -> Result<Vec<TagUsage>> {
        self.tags.filter(&self.repo, query, limit)
    }

    /// Seed the tag cache from every stored card's tags.
    pub fn initialize_tag_cache(&self) -> Result<()> {
        let cards = self.repo.all_cards()?;
        let seeds = cards
            .iter()
            .map(|card| (card.tags.as_slice(), card.updated_at));
        self.tags.initialize_from_cards(&self.repo, seeds)
    }

    /// All cards as a pretty-printed JSON array.
    pub fn export_cards(&self) -> Result<String> {
        let cards = self.repo.all_cards()?;
        Ok(serde_json::to_string_pretty(&cards)?)
    }

    /// Import cards from a JSON array produced by [`export_cards`]
    /// (or another instance of the application).
    ///
    /// Cards whose id already exists are skipped; cards without an id
    /// get a fresh one. Returns the cards actually imported.
    pub fn import_cards(&self, json: &str) -> Result<Vec<Card>> {
        let incoming: Vec<ImportedCard> = serde_json::from_str(json)?;
        let now = Utc::now();
        let mut imported = Vec::new();

        for entry in incoming {
            validate(&entry.question, &entry.answer)?;

            let id = match entry.id {
                Some(id) if !id.is_empty() => {
                    if self.repo.get_card(&id)?.is_some() {
                        continue;
                    }
                    id
                }
                _ => Uuid::new_v4().to_string(),
            };
            let card = Card {
                id,
                question: entry.question,
                answer: entry.answer,
                tags: entry.tags,
                created_at: entry.created_at.unwrap_or(now),
                updated_at: now,
            };
            self.repo.insert_card(&card)?;
            self.repo.init_schedule(&card.id, now)?;
            imported.push(card);
        }

        tracing::info!(count = imported.len(), "cards imported");
        Ok(imported)
    }

    fn degraded<T>(&self, read: impl FnOnce() -> Result<T>, fallback: T) -> T {
        match read() {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(%error, "statistics read failed, returning empty aggregate");
                fallback
            }
        }
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportedCard {
    #[serde(default)]
    id: Option<String>,
    question: String,
    answer: Answer,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

fn validate(question: &str, answer: &Answer) -> Result<()> {
    if question.trim().is_empty() {
        return Err(StoreError::Validation("card is missing a question".into()));
    }
    if answer.content.trim().is_empty() && answer.attachments.as_deref().unwrap_or(&[]).is_empty() {
        return Err(StoreError::Validation("card is missing an answer".into()));
    }
    Ok(())
}
