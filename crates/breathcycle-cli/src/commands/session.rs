use breathcycle_core::{Config, EndMode, SessionConfig};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::Args;

/// Per-invocation overrides on top of the saved configuration.
#[derive(Args, Debug, Default, Clone)]
pub struct SessionArgs {
    /// Exhale duration in seconds (1-180)
    #[arg(long)]
    pub exhale: Option<u32>,
    /// Inhale duration in seconds (1-180)
    #[arg(long)]
    pub inhale: Option<u32>,
    /// End at this time of day, HH:MM
    #[arg(long, conflicts_with = "minutes")]
    pub until: Option<String>,
    /// End after this many minutes (1-1440)
    #[arg(long)]
    pub minutes: Option<u32>,
    /// IANA timezone for --until, e.g. Europe/Stockholm
    #[arg(long)]
    pub tz: Option<String>,
}

impl SessionArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(exhale) = self.exhale {
            config.breath.exhale_secs = exhale;
        }
        if let Some(inhale) = self.inhale {
            config.breath.inhale_secs = inhale;
        }
        if let Some(until) = &self.until {
            config.end.mode = EndMode::Deadline;
            config.end.time = until.clone();
        }
        if let Some(minutes) = self.minutes {
            config.end.mode = EndMode::Elapsed;
            config.end.minutes = minutes;
        }
        if let Some(tz) = &self.tz {
            config.timezone = tz.clone();
        }
    }

    /// Saved configuration with overrides applied, plus the validated session.
    pub fn resolve(&self) -> Result<(Config, SessionConfig), Box<dyn std::error::Error>> {
        let mut config = Config::load()?;
        self.apply(&mut config);
        let session = config.session_config()?;
        Ok((config, session))
    }
}

/// Epoch milliseconds as local wall time in `tz`.
pub fn local_time(ms: u64, tz: Tz, format: &str) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.with_timezone(&tz).format(format).to_string())
        .unwrap_or_else(|| "?".into())
}

/// `12m 05s`
pub fn format_remaining(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}m {:02}s", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_switch_end_mode() {
        let mut config = Config::default();
        let args = SessionArgs {
            exhale: Some(4),
            minutes: Some(3),
            ..SessionArgs::default()
        };
        args.apply(&mut config);
        assert_eq!(config.breath.exhale_secs, 4);
        assert_eq!(config.breath.inhale_secs, 16);
        assert_eq!(config.end.mode, EndMode::Elapsed);
        assert_eq!(config.end.minutes, 3);
    }

    #[test]
    fn until_selects_deadline_mode() {
        let mut config = Config::default();
        config.end.mode = EndMode::Elapsed;
        let args = SessionArgs {
            until: Some("06:15".into()),
            tz: Some("UTC".into()),
            ..SessionArgs::default()
        };
        args.apply(&mut config);
        assert_eq!(config.end.mode, EndMode::Deadline);
        assert_eq!(config.end.time, "06:15");
        assert_eq!(config.timezone, "UTC");
    }

    #[test]
    fn remaining_format() {
        assert_eq!(format_remaining(0), "0m 00s");
        assert_eq!(format_remaining(725_999), "12m 05s");
    }

    #[test]
    fn local_time_uses_zone() {
        let tokyo: Tz = "Asia/Tokyo".parse().unwrap();
        assert_eq!(local_time(0, tokyo, "%H:%M"), "09:00");
    }
}
