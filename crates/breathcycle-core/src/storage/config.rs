//! TOML-based application configuration.
//!
//! Stores the user's preferred session:
//! - Exhale and inhale durations
//! - End condition (time of day or minutes) and timezone
//! - Cue presentation
//!
//! Configuration is stored at `~/.config/breathcycle/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::timer::{parse_time_of_day, parse_timezone, SessionConfig};

/// Breath durations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathConfig {
    #[serde(default = "default_exhale_secs")]
    pub exhale_secs: u32,
    #[serde(default = "default_inhale_secs")]
    pub inhale_secs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndMode {
    Deadline,
    #[serde(alias = "time", alias = "minutes")]
    Elapsed,
}

/// End condition. Both values are kept so switching modes keeps the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndConfig {
    #[serde(default = "default_end_mode")]
    pub mode: EndMode,
    /// `HH:MM`, read in `timezone`.
    #[serde(default = "default_end_time")]
    pub time: String,
    #[serde(default = "default_minutes")]
    pub minutes: u32,
}

/// Cue presentation in the terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueConfig {
    /// Ring the terminal bell on every cue.
    #[serde(default = "default_true")]
    pub bell: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breathcycle/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub breath: BreathConfig,
    #[serde(default)]
    pub end: EndConfig,
    /// IANA zone used for the end time and for "now".
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub cues: CueConfig,
}

// Default functions
fn default_exhale_secs() -> u32 {
    20
}
fn default_inhale_secs() -> u32 {
    16
}
fn default_end_mode() -> EndMode {
    EndMode::Deadline
}
fn default_end_time() -> String {
    "08:00".into()
}
fn default_minutes() -> u32 {
    20
}
fn default_timezone() -> String {
    "Asia/Tokyo".into()
}
fn default_true() -> bool {
    true
}

impl Default for BreathConfig {
    fn default() -> Self {
        Self {
            exhale_secs: default_exhale_secs(),
            inhale_secs: default_inhale_secs(),
        }
    }
}

impl Default for EndConfig {
    fn default() -> Self {
        Self {
            mode: default_end_mode(),
            time: default_end_time(),
            minutes: default_minutes(),
        }
    }
}

impl Default for CueConfig {
    fn default() -> Self {
        Self { bell: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            breath: BreathConfig::default(),
            end: EndConfig::default(),
            timezone: default_timezone(),
            cues: CueConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parent) = parent {
            for part in parent.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            ),
            serde_json::Value::Number(_) => value
                .parse::<u64>()
                .map(|n| serde_json::Value::Number(n.into()))
                .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                return Err(invalid("only leaf keys can be set".into()));
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Change one value in memory. The result must still deserialize.
    pub fn update(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Change one value and persist to the default location.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.update(key, value)?;
        self.save()
    }

    /// Build the engine configuration for a session.
    ///
    /// # Errors
    ///
    /// Fails if the end time or timezone cannot be parsed, or if any active
    /// value is outside its valid range.
    pub fn session_config(&self) -> Result<SessionConfig> {
        let timezone = parse_timezone(&self.timezone)?;
        let cfg = match self.end.mode {
            EndMode::Deadline => SessionConfig::deadline(
                self.breath.exhale_secs,
                self.breath.inhale_secs,
                parse_time_of_day(&self.end.time)?,
                timezone,
            ),
            EndMode::Elapsed => SessionConfig::elapsed(
                self.breath.exhale_secs,
                self.breath.inhale_secs,
                self.end.minutes,
                timezone,
            ),
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ValidationError};
    use crate::timer::EndCondition;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.breath.exhale_secs, 20);
        assert_eq!(cfg.breath.inhale_secs, 16);
        assert_eq!(cfg.end.mode, EndMode::Deadline);
        assert_eq!(cfg.end.time, "08:00");
        assert_eq!(cfg.end.minutes, 20);
        assert_eq!(cfg.timezone, "Asia/Tokyo");
        assert!(cfg.cues.bell);
    }

    #[test]
    fn missing_sections_take_defaults() {
        let cfg: Config = toml::from_str("[breath]\nexhale_secs = 8\n").unwrap();
        assert_eq!(cfg.breath.exhale_secs, 8);
        assert_eq!(cfg.breath.inhale_secs, 16);
        assert_eq!(cfg.end, EndConfig::default());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("breath.exhale_secs").as_deref(), Some("20"));
        assert_eq!(cfg.get("end.mode").as_deref(), Some("deadline"));
        assert_eq!(cfg.get("timezone").as_deref(), Some("Asia/Tokyo"));
        assert_eq!(cfg.get("cues.bell").as_deref(), Some("true"));
        assert!(cfg.get("breath.missing").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn update_changes_number_string_and_bool() {
        let mut cfg = Config::default();
        cfg.update("breath.inhale_secs", "6").unwrap();
        cfg.update("end.mode", "elapsed").unwrap();
        cfg.update("timezone", "Europe/Stockholm").unwrap();
        cfg.update("cues.bell", "false").unwrap();
        assert_eq!(cfg.breath.inhale_secs, 6);
        assert_eq!(cfg.end.mode, EndMode::Elapsed);
        assert_eq!(cfg.timezone, "Europe/Stockholm");
        assert!(!cfg.cues.bell);
    }

    #[test]
    fn update_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.update("breath.hold_secs", "4"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.update("nope", "4"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn update_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.update("cues.bell", "loud").is_err());
        assert!(cfg.update("breath.exhale_secs", "-3").is_err());
        assert!(cfg.update("end.mode", "forever").is_err());
        assert!(cfg.update("breath", "1").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn session_config_deadline_mode() {
        let session = Config::default().session_config().unwrap();
        assert_eq!(session.exhale_secs, 20);
        assert_eq!(session.timezone, chrono_tz::Asia::Tokyo);
        assert!(matches!(session.end, EndCondition::Deadline { .. }));
    }

    #[test]
    fn session_config_elapsed_mode() {
        let mut cfg = Config::default();
        cfg.end.mode = EndMode::Elapsed;
        cfg.end.minutes = 45;
        let session = cfg.session_config().unwrap();
        assert_eq!(session.end, EndCondition::ElapsedMinutes { minutes: 45 });
    }

    #[test]
    fn session_config_validates_active_fields_only() {
        let mut cfg = Config::default();
        cfg.end.minutes = 0;
        assert!(cfg.session_config().is_ok());
        cfg.end.mode = EndMode::Elapsed;
        assert!(matches!(
            cfg.session_config(),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn session_config_rejects_bad_time_and_zone() {
        let mut cfg = Config::default();
        cfg.end.time = "25:00".into();
        assert!(cfg.session_config().is_err());
        cfg.end.time = "06:30".into();
        cfg.timezone = "Atlantis/Capital".into();
        assert!(cfg.session_config().is_err());
    }

    #[test]
    fn end_mode_accepts_aliases() {
        let mut cfg = Config::default();
        cfg.update("end.mode", "time").unwrap();
        assert_eq!(cfg.end.mode, EndMode::Elapsed);
        cfg.update("end.mode", "deadline").unwrap();
        cfg.update("end.mode", "minutes").unwrap();
        assert_eq!(cfg.end.mode, EndMode::Elapsed);
        assert_eq!(cfg.get("end.mode").as_deref(), Some("elapsed"));
        assert!(cfg.update("end.mode", "never").is_err());
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.update("end.time", "21:45").unwrap();
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().end.time, "21:45");
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "breath = [not toml").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
