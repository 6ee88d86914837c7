//! Local calendar windows for statistics queries.
//!
//! Stats bucket reviews and card creations by the user's local
//! calendar day, with weeks starting Monday (ISO convention). Windows
//! are returned as half-open UTC instant ranges so they can be
//! compared directly against stored timestamps.

use chrono::{DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};

/// UTC range covering the local calendar day `day`: `[start, end)`.
pub fn day_range(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    (local_midnight(day), local_midnight(day + Duration::days(1)))
}

/// UTC range covering the local Monday-start week containing `now`.
pub fn week_range(now: DateTime<Local>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    (local_midnight(monday), local_midnight(monday + Duration::days(7)))
}

fn local_midnight(day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    match midnight.and_local_timezone(Local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // Midnight skipped by a DST transition.
        LocalResult::None => Utc.from_utc_datetime(&midnight),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_range_spans_the_given_day() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (start, end) = day_range(day);
        assert!(start < end);
        assert_eq!(start.with_timezone(&Local).date_naive(), day);
    }

    #[test]
    fn week_range_starts_on_monday() {
        // 2024-01-17 was a Wednesday.
        let wednesday = Local
            .with_ymd_and_hms(2024, 1, 17, 12, 0, 0)
            .single()
            .unwrap();
        let (start, end) = week_range(wednesday);
        let start_local = start.with_timezone(&Local);
        assert_eq!(start_local.weekday(), chrono::Weekday::Mon);
        assert_eq!(
            start_local.date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert!(start <= wednesday.with_timezone(&Utc));
        assert!(wednesday.with_timezone(&Utc) < end);
    }

    #[test]
    fn week_of_a_sunday_started_six_days_earlier() {
        // 2024-01-21 was a Sunday; its week begins Monday the 15th.
        let sunday = Local
            .with_ymd_and_hms(2024, 1, 21, 12, 0, 0)
            .single()
            .unwrap();
        let (start, _) = week_range(sunday);
        assert_eq!(
            start.with_timezone(&Local).date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }
}
