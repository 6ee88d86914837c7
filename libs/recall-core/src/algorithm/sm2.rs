//! SM-2 spaced repetition algorithm.
//!
//! Based on SuperMemo 2 with a 0-5 rating scale. Ratings of 3 and above
//! grow the interval, 2 shrinks it, 0-1 reset the card.

use chrono::{DateTime, Duration, Utc};

use crate::types::{Rating, ReviewSchedule};

/// SM-2 algorithm with configurable parameters.
#[derive(Debug, Clone)]
pub struct Sm2 {
    /// Interval in days after a reset or first pass.
    pub initial_interval: u32,
    pub default_ease: f64,
    pub minimum_ease: f64,
}

impl Default for Sm2 {
    fn default() -> Self {
        Self {
            initial_interval: 1,
            default_ease: 2.5,
            minimum_ease: 1.3,
        }
    }
}

impl Sm2 {
    /// Compute the schedule after reviewing `current` with `rating` at `now`.
    ///
    /// Pure and deterministic; the only mutation is the returned value.
    pub fn schedule(
        &self,
        current: &ReviewSchedule,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> ReviewSchedule {
        let quality = rating.value();
        let mut interval = current.interval;
        let mut repetitions = current.repetitions;
        let mut ease_factor = current.ease_factor;

        if quality >= 3 {
            interval = match repetitions {
                0 => 1,
                1 => 6,
                _ => round_days(interval as f64 * ease_factor),
            };
            repetitions += 1;
            let q = (5 - quality) as f64;
            ease_factor += 0.1 - q * (0.08 + q * 0.02);
        } else if quality == 2 {
            interval = if repetitions == 0 {
                1
            } else {
                round_days(interval as f64 * 0.8).max(1)
            };
            repetitions += 1;
            ease_factor -= 0.15;
        } else {
            interval = self.initial_interval;
            repetitions = 0;
            ease_factor -= 0.2;
        }

        ease_factor = ease_factor.max(self.minimum_ease);

        let mut performance_history = current.performance_history.clone();
        performance_history.push(rating);

        ReviewSchedule {
            card_id: current.card_id.clone(),
            due_date: now + Duration::days(interval as i64),
            interval,
            repetitions,
            // Stored at 2-decimal precision.
            ease_factor: (ease_factor * 100.0).round() / 100.0,
            performance_history,
            last_reviewed: Some(now),
        }
    }
}

fn round_days(days: f64) -> u32 {
    days.round() as u32
}

/// Sort key for presenting cards: overdue cards first (most overdue
/// highest), then upcoming cards soonest-first. Does not affect which
/// cards count as due.
pub fn review_priority(schedule: &ReviewSchedule, now: DateTime<Utc>) -> i64 {
    let seconds_until_due = (schedule.due_date - now).num_seconds();
    let days_until_due = (seconds_until_due as f64 / 86_400.0).ceil() as i64;

    if days_until_due <= 0 {
        1000 + days_until_due.abs()
    } else {
        100 - days_until_due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn schedule_with(interval: u32, repetitions: u32, ease_factor: f64) -> ReviewSchedule {
        ReviewSchedule {
            interval,
            repetitions,
            ease_factor,
            ..ReviewSchedule::initial("c1", at(2024, 1, 1))
        }
    }

    #[test]
    fn first_pass_gives_one_day() {
        let sm2 = Sm2::default();
        for quality in 3..=5u8 {
            let rating = Rating::try_from(quality).unwrap();
            let next = sm2.schedule(&schedule_with(1, 0, 2.5), rating, at(2024, 1, 1));
            assert_eq!(next.interval, 1);
            assert_eq!(next.repetitions, 1);
        }
    }

    #[test]
    fn second_pass_gives_six_days() {
        let sm2 = Sm2::default();
        for quality in 3..=5u8 {
            let rating = Rating::try_from(quality).unwrap();
            let next = sm2.schedule(&schedule_with(1, 1, 2.5), rating, at(2024, 1, 1));
            assert_eq!(next.interval, 6);
            assert_eq!(next.repetitions, 2);
        }
    }

    #[test]
    fn later_passes_multiply_by_ease() {
        let sm2 = Sm2::default();
        let next = sm2.schedule(&schedule_with(6, 2, 2.5), Rating::Perfect, at(2024, 1, 1));
        assert_eq!(next.interval, 15); // round(6 * 2.5)
        assert_eq!(next.repetitions, 3);
    }

    #[test]
    fn marginal_review_shrinks_interval() {
        let sm2 = Sm2::default();
        let next = sm2.schedule(&schedule_with(10, 3, 2.5), Rating::Hard, at(2024, 1, 1));
        assert_eq!(next.interval, 8); // round(10 * 0.8)
        assert_eq!(next.repetitions, 4);
        assert_eq!(next.ease_factor, 2.35);
    }

    #[test]
    fn marginal_review_never_goes_below_one_day() {
        let sm2 = Sm2::default();
        let next = sm2.schedule(&schedule_with(1, 5, 1.3), Rating::Hard, at(2024, 1, 1));
        assert_eq!(next.interval, 1);
    }

    #[test]
    fn fail_resets_regardless_of_prior_state() {
        let sm2 = Sm2::default();
        for quality in 0..=1u8 {
            let rating = Rating::try_from(quality).unwrap();
            let next = sm2.schedule(&schedule_with(120, 9, 2.8), rating, at(2024, 1, 1));
            assert_eq!(next.interval, 1);
            assert_eq!(next.repetitions, 0);
        }
    }

    #[test]
    fn ease_factor_never_below_minimum() {
        let sm2 = Sm2::default();
        for quality in 0..=5u8 {
            let rating = Rating::try_from(quality).unwrap();
            let next = sm2.schedule(&schedule_with(4, 2, 1.3), rating, at(2024, 1, 1));
            assert!(next.ease_factor >= 1.3, "quality {quality}");
        }
    }

    #[test]
    fn history_grows_by_one_per_review() {
        let sm2 = Sm2::default();
        let mut schedule = ReviewSchedule::initial("c1", at(2024, 1, 1));
        for (i, rating) in [Rating::Good, Rating::Wrong, Rating::Perfect].iter().enumerate() {
            schedule = sm2.schedule(&schedule, *rating, at(2024, 1, 1));
            assert_eq!(schedule.performance_history.len(), i + 1);
        }
        assert_eq!(
            schedule.performance_history,
            vec![Rating::Good, Rating::Wrong, Rating::Perfect]
        );
    }

    #[test]
    fn replaying_ratings_is_deterministic() {
        let sm2 = Sm2::default();
        let ratings = [Rating::Good, Rating::Easy, Rating::Hard, Rating::Perfect];

        let run = || {
            let mut schedule = ReviewSchedule::initial("c1", at(2024, 1, 1));
            for rating in ratings {
                schedule = sm2.schedule(&schedule, rating, at(2024, 1, 1));
            }
            schedule
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn first_review_scenario() {
        // New card created 2024-01-01, reviewed same day with rating 4.
        let sm2 = Sm2::default();
        let now = at(2024, 1, 1);
        let next = sm2.schedule(&ReviewSchedule::initial("c1", now), Rating::Easy, now);
        assert_eq!(next.interval, 1);
        assert_eq!(next.repetitions, 1);
        assert_eq!(next.due_date, at(2024, 1, 2));
        // Rating 4 leaves the ease factor unchanged: 0.1 - 1*(0.08 + 0.02) = 0.
        assert_eq!(next.ease_factor, 2.5);
    }

    #[test]
    fn perfect_rating_raises_ease() {
        let sm2 = Sm2::default();
        let now = at(2024, 1, 1);
        let next = sm2.schedule(&ReviewSchedule::initial("c1", now), Rating::Perfect, now);
        assert_eq!(next.ease_factor, 2.6);
    }

    #[test]
    fn second_review_scenario() {
        // Same card reviewed 2024-01-02 with rating 5.
        let sm2 = Sm2::default();
        let first = sm2.schedule(
            &ReviewSchedule::initial("c1", at(2024, 1, 1)),
            Rating::Easy,
            at(2024, 1, 1),
        );
        let second = sm2.schedule(&first, Rating::Perfect, at(2024, 1, 2));
        assert_eq!(second.repetitions, 2);
        assert_eq!(second.interval, 6);
        assert_eq!(second.due_date, at(2024, 1, 8));
    }

    #[test]
    fn lapse_scenario() {
        let sm2 = Sm2::default();
        let next = sm2.schedule(&schedule_with(10, 3, 2.5), Rating::Wrong, at(2024, 1, 1));
        assert_eq!(next.repetitions, 0);
        assert_eq!(next.interval, 1);
        assert_eq!(next.ease_factor, 2.3);
    }

    #[test]
    fn overdue_cards_outrank_upcoming_cards() {
        let now = at(2024, 1, 10);
        let overdue = ReviewSchedule {
            due_date: at(2024, 1, 7),
            ..ReviewSchedule::initial("a", now)
        };
        let due_now = ReviewSchedule {
            due_date: now,
            ..ReviewSchedule::initial("b", now)
        };
        let upcoming = ReviewSchedule {
            due_date: at(2024, 1, 13),
            ..ReviewSchedule::initial("c", now)
        };

        assert!(review_priority(&overdue, now) > review_priority(&due_now, now));
        assert!(review_priority(&due_now, now) > review_priority(&upcoming, now));
    }
}
