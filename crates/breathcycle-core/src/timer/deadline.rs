//! Deadline calculator.
//!
//! Converts a session's end condition into an absolute instant (epoch
//! milliseconds). Pure: the caller supplies "now".

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::session::{EndCondition, SessionConfig};
use crate::error::ValidationError;

/// Absolute deadline for a session starting at `now_ms`.
///
/// Deadline mode returns the next occurrence of the configured time of day
/// in the session timezone, strictly after `now_ms`. Elapsed mode returns
/// `now_ms` plus the budget.
pub fn compute_deadline(config: &SessionConfig, now_ms: u64) -> Result<u64, ValidationError> {
    match config.end {
        EndCondition::ElapsedMinutes { minutes } => {
            Ok(now_ms.saturating_add(u64::from(minutes) * 60_000))
        }
        EndCondition::Deadline { at } => next_occurrence(at, config.timezone, now_ms),
    }
}

/// Deadline re-derived from a frozen remaining budget.
///
/// Used when resuming an elapsed-mode session so the paused time does not
/// count against the budget.
pub fn deadline_from_remaining(now_ms: u64, remaining_ms: u64) -> u64 {
    now_ms.saturating_add(remaining_ms)
}

fn next_occurrence(at: NaiveTime, tz: Tz, now_ms: u64) -> Result<u64, ValidationError> {
    let invalid = || ValidationError::InvalidInstant { ms: now_ms };
    let now = i64::try_from(now_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or_else(invalid)?;

    let today = now.with_timezone(&tz).date_naive();
    let mut target = resolve_local(tz, today, at).ok_or_else(invalid)?;
    if target <= now {
        let tomorrow = today.succ_opt().ok_or_else(invalid)?;
        target = resolve_local(tz, tomorrow, at).ok_or_else(invalid)?;
    }
    // Only reachable when a DST shift eats the whole gap.
    if target <= now {
        target += Duration::hours(24);
    }

    u64::try_from(target.timestamp_millis()).map_err(|_| invalid())
}

/// Wall-clock `at` on `date` in `tz`. Ambiguous times (fall back) take the
/// earlier instant; times inside a spring-forward gap move one hour later.
fn resolve_local(tz: Tz, date: NaiveDate, at: NaiveTime) -> Option<DateTime<Utc>> {
    let naive = date.and_time(at);
    let local = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz.from_local_datetime(&(naive + Duration::hours(1))).earliest(),
    };
    local.map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use chrono_tz::{Asia::Tokyo, Europe::Stockholm};
    use proptest::prelude::*;

    fn ms(tz: Tz, y: i32, mo: u32, d: u32, h: u32, mi: u32) -> u64 {
        tz.with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .timestamp_millis() as u64
    }

    fn deadline_cfg(h: u32, m: u32, tz: Tz) -> SessionConfig {
        SessionConfig::deadline(20, 16, NaiveTime::from_hms_opt(h, m, 0).unwrap(), tz)
    }

    #[test]
    fn past_time_of_day_rolls_to_tomorrow() {
        let now = ms(Tokyo, 2026, 10, 19, 9, 0);
        let deadline = compute_deadline(&deadline_cfg(8, 0, Tokyo), now).unwrap();
        assert_eq!(deadline, ms(Tokyo, 2026, 10, 20, 8, 0));
    }

    #[test]
    fn future_time_of_day_stays_today() {
        let now = ms(Tokyo, 2026, 10, 19, 7, 0);
        let deadline = compute_deadline(&deadline_cfg(8, 0, Tokyo), now).unwrap();
        assert_eq!(deadline, ms(Tokyo, 2026, 10, 19, 8, 0));
    }

    #[test]
    fn exactly_now_rolls_to_tomorrow() {
        let now = ms(Tokyo, 2026, 10, 19, 8, 0);
        let deadline = compute_deadline(&deadline_cfg(8, 0, Tokyo), now).unwrap();
        assert_eq!(deadline, ms(Tokyo, 2026, 10, 20, 8, 0));
    }

    #[test]
    fn rollover_across_midnight() {
        let now = ms(Tokyo, 2026, 12, 31, 23, 30);
        let deadline = compute_deadline(&deadline_cfg(0, 15, Tokyo), now).unwrap();
        assert_eq!(deadline, ms(Tokyo, 2027, 1, 1, 0, 15));
    }

    #[test]
    fn time_of_day_is_read_in_configured_zone() {
        // 07:00 in Stockholm is 14:00/15:00 in Tokyo; 08:00 Stockholm is still ahead.
        let now = ms(Stockholm, 2026, 6, 1, 7, 0);
        let deadline = compute_deadline(&deadline_cfg(8, 0, Stockholm), now).unwrap();
        assert_eq!(deadline - now, 60 * 60 * 1000);
    }

    #[test]
    fn spring_forward_gap_moves_one_hour_later() {
        // Stockholm skips 02:00-03:00 on 2026-03-29.
        let now = ms(Stockholm, 2026, 3, 29, 1, 0);
        let deadline = compute_deadline(&deadline_cfg(2, 30, Stockholm), now).unwrap();
        let local = DateTime::<Utc>::from_timestamp_millis(deadline as i64)
            .unwrap()
            .with_timezone(&Stockholm);
        assert_eq!((local.hour(), local.minute()), (3, 30));
    }

    #[test]
    fn fall_back_ambiguity_takes_earlier_instant() {
        // 02:30 happens twice in Stockholm on 2026-10-25.
        let now = ms(Stockholm, 2026, 10, 25, 1, 0);
        let deadline = compute_deadline(&deadline_cfg(2, 30, Stockholm), now).unwrap();
        assert_eq!(deadline - now, 90 * 60 * 1000);
    }

    #[test]
    fn elapsed_mode_adds_budget() {
        let cfg = SessionConfig::elapsed(4, 4, 20, Tokyo);
        assert_eq!(compute_deadline(&cfg, 1_000).unwrap(), 1_000 + 20 * 60_000);
    }

    #[test]
    fn remaining_budget_rebases_on_now() {
        assert_eq!(deadline_from_remaining(500_000, 420_000), 920_000);
    }

    #[test]
    fn unrepresentable_now_is_rejected() {
        let err = compute_deadline(&deadline_cfg(8, 0, Tokyo), u64::MAX).unwrap_err();
        assert_eq!(err, ValidationError::InvalidInstant { ms: u64::MAX });
    }

    proptest! {
        #[test]
        fn deadline_is_strictly_ahead_and_within_a_day(
            now in 0u64..4_000_000_000_000,
            hour in 0u32..24,
            minute in 0u32..60,
        ) {
            let deadline = compute_deadline(&deadline_cfg(hour, minute, Tokyo), now).unwrap();
            prop_assert!(deadline > now);
            prop_assert!(deadline - now <= 24 * 60 * 60 * 1000);
        }
    }
}
