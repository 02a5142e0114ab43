//! Interfaces to the services the planner depends on but does not own.
//!
//! - [`CalendarStore`]: committed blocks, quiet hours, and where accepted
//!   ghosts end up
//! - [`SuggestionGenerator`]: the recommendation source proposing untimed
//!   activities
//! - [`Clock`]: the current instant, injectable for tests
//!
//! In-memory implementations are provided for tests and the CLI.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, GeneratorError};
use crate::interval::TimeInterval;
use crate::refresh::RefreshReason;
use crate::suggestion::{CandidateSuggestion, PlacedSuggestion};
use crate::timeline::{DayContext, QuietHoursPolicy};

/// Calendar data the planner reads from and commits to.
pub trait CalendarStore: Send + Sync {
    /// Busy intervals for `day`.
    fn current_day_blocks(&self, day: &DayContext) -> Result<Vec<TimeInterval>, CalendarError>;

    /// Quiet hours resolved to concrete intervals touching `day`.
    fn quiet_hour_windows(&self, day: &DayContext) -> Vec<TimeInterval>;

    /// Persist an accepted ghost as a real block.
    fn commit(&self, suggestion: &PlacedSuggestion) -> Result<(), CalendarError>;
}

/// What the generator is told about the day it is proposing for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySummary {
    pub day: DayContext,
    pub committed: Vec<TimeInterval>,
    pub free_minutes: i64,
    /// Titles currently shown as ghosts, so the generator can avoid repeats.
    pub current_titles: Vec<String>,
    /// Titles the user dismissed today.
    #[serde(default)]
    pub dismissed_titles: Vec<String>,
}

/// Source of untimed candidate suggestions.
#[async_trait]
pub trait SuggestionGenerator: Send + Sync {
    async fn generate(
        &self,
        summary: &DaySummary,
        reason: Option<RefreshReason>,
    ) -> Result<Vec<CandidateSuggestion>, GeneratorError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = *now + by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Calendar kept in memory. Committed ghosts become busy blocks.
#[derive(Debug, Default)]
pub struct InMemoryCalendarStore {
    blocks: Mutex<Vec<TimeInterval>>,
    committed: Mutex<Vec<PlacedSuggestion>>,
    quiet_hours: QuietHoursPolicy,
}

impl InMemoryCalendarStore {
    pub fn new(blocks: Vec<TimeInterval>, quiet_hours: QuietHoursPolicy) -> Self {
        Self {
            blocks: Mutex::new(blocks),
            committed: Mutex::new(Vec::new()),
            quiet_hours,
        }
    }

    /// Add a block the way a manual edit would.
    pub fn add_block(&self, block: TimeInterval) {
        self.blocks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(block);
    }

    pub fn committed(&self) -> Vec<PlacedSuggestion> {
        self.committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CalendarStore for InMemoryCalendarStore {
    fn current_day_blocks(&self, day: &DayContext) -> Result<Vec<TimeInterval>, CalendarError> {
        let bounds = day.bounds();
        let blocks = self.blocks.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(blocks.iter().filter(|b| b.overlaps(&bounds)).copied().collect())
    }

    fn quiet_hour_windows(&self, day: &DayContext) -> Vec<TimeInterval> {
        self.quiet_hours.resolve(day)
    }

    fn commit(&self, suggestion: &PlacedSuggestion) -> Result<(), CalendarError> {
        let block = suggestion
            .interval()
            .ok_or_else(|| CalendarError::CommitRejected {
                title: suggestion.title().to_string(),
                message: "placement has no length".to_string(),
            })?;
        self.add_block(block);
        self.committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(suggestion.clone());
        Ok(())
    }
}

/// Generator that always proposes the same list.
#[derive(Debug, Default)]
pub struct StaticGenerator {
    candidates: Mutex<Vec<CandidateSuggestion>>,
}

impl StaticGenerator {
    pub fn new(candidates: Vec<CandidateSuggestion>) -> Self {
        Self {
            candidates: Mutex::new(candidates),
        }
    }

    pub fn replace(&self, candidates: Vec<CandidateSuggestion>) {
        *self.candidates.lock().unwrap_or_else(PoisonError::into_inner) = candidates;
    }
}

#[async_trait]
impl SuggestionGenerator for StaticGenerator {
    async fn generate(
        &self,
        _summary: &DaySummary,
        _reason: Option<RefreshReason>,
    ) -> Result<Vec<CandidateSuggestion>, GeneratorError> {
        Ok(self
            .candidates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn commit_turns_ghost_into_block() {
        let store = InMemoryCalendarStore::default();
        let day = DayContext::new(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), 0).unwrap();
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let ghost = PlacedSuggestion::new(CandidateSuggestion::new("Walk", 20), start, Duration::minutes(20));

        store.commit(&ghost).unwrap();

        let blocks = store.current_day_blocks(&day).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start(), start);
        assert_eq!(store.committed().len(), 1);
    }

    #[test]
    fn fixed_clock_advances() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now(), start + Duration::minutes(5));
    }
}
