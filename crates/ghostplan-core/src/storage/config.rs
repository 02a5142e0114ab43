//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Gap detection threshold
//! - Placement rules (minimum length, time grid, trailing buffer)
//! - Refresh cadence and whether ghost suggestions are enabled at all
//! - Recurring quiet hours
//!
//! Configuration is stored at `~/.config/ghostplan/config.toml`.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::placement::PlacementEngine;
use crate::timeline::{GapCalculator, QuietHoursPolicy, QuietWindow};

/// Gap detection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapSettings {
    #[serde(default = "default_min_gap_minutes")]
    pub min_gap_minutes: u32,
}

/// Placement configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementSettings {
    #[serde(default = "default_min_duration_minutes")]
    pub min_duration_minutes: u32,
    #[serde(default = "default_snap_minutes")]
    pub snap_minutes: u32,
    #[serde(default = "default_buffer_minutes")]
    pub buffer_minutes: u32,
}

/// Refresh loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Ghost suggestions on or off.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/ghostplan/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gaps: GapSettings,
    #[serde(default)]
    pub placement: PlacementSettings,
    #[serde(default)]
    pub refresh: RefreshSettings,
    #[serde(default = "default_quiet_hours")]
    pub quiet_hours: QuietHoursPolicy,
    /// Fixed offset of the user's local time from UTC.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

// Default functions
fn default_min_gap_minutes() -> u32 {
    10
}
fn default_min_duration_minutes() -> u32 {
    10
}
fn default_snap_minutes() -> u32 {
    5
}
fn default_buffer_minutes() -> u32 {
    2
}
fn default_interval_secs() -> u64 {
    8
}
fn default_true() -> bool {
    true
}
fn default_quiet_hours() -> QuietHoursPolicy {
    let (start, end) = (NaiveTime::from_hms_opt(22, 0, 0), NaiveTime::from_hms_opt(6, 0, 0));
    match (start, end) {
        (Some(start), Some(end)) => QuietHoursPolicy::new(vec![QuietWindow::daily(start, end)]),
        _ => QuietHoursPolicy::default(),
    }
}

impl Default for GapSettings {
    fn default() -> Self {
        Self {
            min_gap_minutes: default_min_gap_minutes(),
        }
    }
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            min_duration_minutes: default_min_duration_minutes(),
            snap_minutes: default_snap_minutes(),
            buffer_minutes: default_buffer_minutes(),
        }
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            enabled: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gaps: GapSettings::default(),
            placement: PlacementSettings::default(),
            refresh: RefreshSettings::default(),
            quiet_hours: default_quiet_hours(),
            utc_offset_minutes: 0,
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
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            let obj = current
                .as_object_mut()
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
            let existing = obj
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

            if parts.peek().is_some() {
                current = existing;
                continue;
            }

            *existing = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<i64>() {
                        serde_json::Value::Number(n.into())
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as integer")));
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };
            return Ok(());
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// `config.toml` inside [`data_dir`].
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`, writing defaults there if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::default_path()?)
    }

    /// Persist to `path`.
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

    /// Set a value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the resulting config is invalid.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Reject settings the planner cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };
        if self.gaps.min_gap_minutes == 0 {
            return Err(invalid("gaps.min_gap_minutes", "must be at least 1"));
        }
        if self.placement.min_duration_minutes == 0 {
            return Err(invalid("placement.min_duration_minutes", "must be at least 1"));
        }
        if self.placement.snap_minutes == 0 || 60 % self.placement.snap_minutes != 0 {
            return Err(invalid("placement.snap_minutes", "must divide 60"));
        }
        if self.refresh.interval_secs == 0 {
            return Err(invalid("refresh.interval_secs", "must be at least 1"));
        }
        if self.utc_offset_minutes.abs() > 18 * 60 {
            return Err(invalid("utc_offset_minutes", "must be within +/-18h"));
        }
        self.quiet_hours
            .validate()
            .map_err(|e| invalid("quiet_hours.windows", &e.to_string()))
    }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh.interval_secs)
    }

    pub fn gap_calculator(&self) -> GapCalculator {
        GapCalculator::new().with_min_gap(Duration::minutes(i64::from(self.gaps.min_gap_minutes)))
    }

    pub fn placement_engine(&self) -> PlacementEngine {
        PlacementEngine::from_settings(&self.placement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.refresh.interval_secs, 8);
        assert_eq!(parsed.quiet_hours.windows.len(), 1);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[placement]\nbuffer_minutes = 0\n").unwrap();
        assert_eq!(parsed.placement.buffer_minutes, 0);
        assert_eq!(parsed.placement.snap_minutes, 5);
        assert_eq!(parsed.gaps.min_gap_minutes, 10);
    }

    #[test]
    fn get_by_dotted_key() {
        let cfg = Config::default();
        assert_eq!(cfg.get("placement.snap_minutes").as_deref(), Some("5"));
        assert_eq!(cfg.get("refresh.enabled").as_deref(), Some("true"));
        assert!(cfg.get("nope").is_none());
    }

    #[test]
    fn set_value_updates_and_validates() {
        let mut cfg = Config::default();
        cfg.set_value("refresh.interval_secs", "30").unwrap();
        assert_eq!(cfg.refresh.interval_secs, 30);

        cfg.set_value("refresh.enabled", "false").unwrap();
        assert!(!cfg.refresh.enabled);

        assert!(matches!(
            cfg.set_value("placement.snap_minutes", "7"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg.placement.snap_minutes, 5);

        assert!(matches!(
            cfg.set_value("placement.nope", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn quiet_hours_can_be_set_as_json() {
        let mut cfg = Config::default();
        cfg.set_value(
            "quiet_hours.windows",
            r#"[{"start":"12:00","end":"13:00","weekdays":["Sat"]}]"#,
        )
        .unwrap();
        assert_eq!(cfg.quiet_hours.windows.len(), 1);
        assert_eq!(cfg.quiet_hours.windows[0].weekdays, vec![chrono::Weekday::Sat]);
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.utc_offset_minutes = 540;
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().utc_offset_minutes, 540);
    }

    #[test]
    fn invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[refresh]\ninterval_secs = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
