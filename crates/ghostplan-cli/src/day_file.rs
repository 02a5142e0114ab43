//! The JSON day description the commands read.
//!
//! ```json
//! {
//!   "date": "2026-03-02",
//!   "utc_offset_minutes": 60,
//!   "now": "2026-03-02T07:30:00Z",
//!   "blocks": [{ "start": "2026-03-02T09:00:00Z", "end": "2026-03-02T10:00:00Z" }],
//!   "candidates": [{ "title": "Walk", "requested_minutes": 20 }]
//! }
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Deserialize;

use ghostplan_core::{
    CandidateSuggestion, Config, DayContext, InMemoryCalendarStore, PlacedSuggestion, TimeInterval,
};

#[derive(Debug, Clone, Deserialize)]
pub struct DayFile {
    pub date: NaiveDate,
    /// Falls back to the configured offset.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
    /// Falls back to the wall clock.
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    #[serde(default)]
    pub blocks: Vec<TimeInterval>,
    #[serde(default)]
    pub candidates: Vec<CandidateSuggestion>,
}

impl DayFile {
    pub fn read(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        let file: DayFile = serde_json::from_str(&content)
            .map_err(|e| format!("invalid day file {}: {e}", path.display()))?;
        Ok(file)
    }

    pub fn day(&self, config: &Config) -> Result<DayContext, Box<dyn std::error::Error>> {
        let offset = self.utc_offset_minutes.unwrap_or(config.utc_offset_minutes);
        Ok(DayContext::new(self.date, offset)?)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    pub fn calendar(&self, config: &Config) -> InMemoryCalendarStore {
        InMemoryCalendarStore::new(self.blocks.clone(), config.quiet_hours.clone())
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path: PathBuf = match path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()?,
    };
    Ok(Config::load_from(&path)?)
}

/// `HH:MM` in the day's local time.
pub fn local_hhmm(day: &DayContext, at: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(day.utc_offset_minutes * 60) {
        Some(offset) => at.with_timezone(&offset).format("%H:%M").to_string(),
        None => at.format("%H:%MZ").to_string(),
    }
}

pub fn describe_interval(day: &DayContext, interval: &TimeInterval) -> String {
    format!(
        "{}-{} ({} min)",
        local_hhmm(day, interval.start()),
        local_hhmm(day, interval.end()),
        interval.duration_minutes()
    )
}

pub fn describe_placement(day: &DayContext, placed: &PlacedSuggestion) -> String {
    let emoji = if placed.candidate.emoji.is_empty() {
        String::new()
    } else {
        format!("{} ", placed.candidate.emoji)
    };
    format!(
        "{}-{}  {emoji}{} [{}, {} min]",
        local_hhmm(day, placed.start),
        local_hhmm(day, placed.end()),
        placed.title(),
        placed.candidate.energy,
        placed.duration_minutes
    )
}
