use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Inclusive bounds for exhale/inhale durations, in seconds.
pub const BREATH_SECS_RANGE: (u32, u32) = (1, 180);
/// Inclusive bounds for the elapsed-time budget, in minutes.
pub const ELAPSED_MINUTES_RANGE: (u32, u32) = (1, 1440);

/// When a session should wind down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EndCondition {
    /// Wall-clock time of day in the session timezone. Today if still ahead,
    /// otherwise tomorrow.
    Deadline { at: NaiveTime },
    /// Budget counted from the start of the session.
    ElapsedMinutes { minutes: u32 },
}

impl EndCondition {
    pub fn is_elapsed(&self) -> bool {
        matches!(self, EndCondition::ElapsedMinutes { .. })
    }
}

/// Configuration for a single run. Immutable once the run has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub exhale_secs: u32,
    pub inhale_secs: u32,
    pub end: EndCondition,
    pub timezone: Tz,
}

impl SessionConfig {
    pub fn elapsed(exhale_secs: u32, inhale_secs: u32, minutes: u32, timezone: Tz) -> Self {
        Self {
            exhale_secs,
            inhale_secs,
            end: EndCondition::ElapsedMinutes { minutes },
            timezone,
        }
    }

    pub fn deadline(exhale_secs: u32, inhale_secs: u32, at: NaiveTime, timezone: Tz) -> Self {
        Self {
            exhale_secs,
            inhale_secs,
            end: EndCondition::Deadline { at },
            timezone,
        }
    }

    /// Reject any active field outside its valid range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("exhale_secs", self.exhale_secs, BREATH_SECS_RANGE)?;
        check_range("inhale_secs", self.inhale_secs, BREATH_SECS_RANGE)?;
        if let EndCondition::ElapsedMinutes { minutes } = self.end {
            check_range("elapsed_minutes", minutes, ELAPSED_MINUTES_RANGE)?;
        }
        Ok(())
    }

    pub fn exhale_ms(&self) -> u64 {
        u64::from(self.exhale_secs) * 1000
    }

    pub fn inhale_ms(&self) -> u64 {
        u64::from(self.inhale_secs) * 1000
    }

    /// Length of one exhale+inhale pair.
    pub fn pair_ms(&self) -> u64 {
        self.exhale_ms() + self.inhale_ms()
    }
}

fn check_range(field: &'static str, value: u32, (min, max): (u32, u32)) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Parse an `HH:MM` time of day.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| ValidationError::InvalidTimeOfDay(s.to_string()))
}

/// Parse an IANA timezone identifier such as `Asia/Tokyo`.
pub fn parse_timezone(s: &str) -> Result<Tz, ValidationError> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| ValidationError::UnknownTimezone(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokyo() -> Tz {
        chrono_tz::Asia::Tokyo
    }

    #[test]
    fn accepts_bounds() {
        assert!(SessionConfig::elapsed(1, 180, 1, tokyo()).validate().is_ok());
        assert!(SessionConfig::elapsed(180, 1, 1440, tokyo()).validate().is_ok());
    }

    #[test]
    fn rejects_zero_exhale() {
        let err = SessionConfig::elapsed(0, 4, 10, tokyo()).validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                field: "exhale_secs",
                value: 0,
                min: 1,
                max: 180
            }
        );
    }

    #[test]
    fn rejects_long_inhale() {
        let err = SessionConfig::elapsed(4, 181, 10, tokyo()).validate().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutOfRange {
                field: "inhale_secs",
                ..
            }
        ));
    }

    #[test]
    fn rejects_elapsed_budget_out_of_range() {
        assert!(SessionConfig::elapsed(4, 4, 0, tokyo()).validate().is_err());
        assert!(SessionConfig::elapsed(4, 4, 1441, tokyo()).validate().is_err());
    }

    #[test]
    fn deadline_mode_ignores_elapsed_bounds() {
        let at = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        assert!(SessionConfig::deadline(20, 16, at, tokyo()).validate().is_ok());
    }

    #[test]
    fn pair_duration() {
        let cfg = SessionConfig::elapsed(10, 6, 5, tokyo());
        assert_eq!(cfg.pair_ms(), 16_000);
    }

    #[test]
    fn parses_time_of_day() {
        assert_eq!(
            parse_time_of_day("08:00").unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap()
        );
        assert_eq!(
            parse_time_of_day("23:59").unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap()
        );
        assert!(parse_time_of_day("24:00").is_err());
        assert!(parse_time_of_day("8am").is_err());
    }

    #[test]
    fn parses_timezones() {
        assert_eq!(parse_timezone("Europe/Stockholm").unwrap(), chrono_tz::Europe::Stockholm);
        assert_eq!(parse_timezone("UTC").unwrap(), chrono_tz::UTC);
        assert!(matches!(
            parse_timezone("Nowhere/Land"),
            Err(ValidationError::UnknownTimezone(_))
        ));
    }

    #[test]
    fn end_condition_serializes_with_mode_tag() {
        let cfg = SessionConfig::elapsed(2, 2, 1, chrono_tz::UTC);
        let json = serde_json::to_value(cfg).unwrap();
        assert_eq!(json["end"]["mode"], "elapsed_minutes");
        assert_eq!(json["end"]["minutes"], 1);
    }
}
