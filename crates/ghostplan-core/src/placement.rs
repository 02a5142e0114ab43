//! Greedy placement of candidate suggestions into free gaps.
//!
//! Candidates are taken in the order the generator returned them (its
//! priority order). Each one goes into the earliest gap that can still hold
//! the minimum duration, shrunk if the gap is shorter than requested. Gaps
//! are consumed as placements land, so later candidates see what is left.

use chrono::{DateTime, Duration, Utc};

use crate::interval::{snap_up, TimeInterval};
use crate::storage::PlacementSettings;
use crate::suggestion::{CandidateSuggestion, PlacedSuggestion};

/// Greedy gap filler.
#[derive(Debug, Clone)]
pub struct PlacementEngine {
    min_duration: Duration,
    snap_minutes: i64,
    buffer: Duration,
}

/// Where a candidate would land inside one gap.
#[derive(Debug, Clone, Copy)]
struct Fit {
    start: DateTime<Utc>,
    duration: Duration,
    buffer: Duration,
}

impl Fit {
    fn consumed_until(&self) -> DateTime<Utc> {
        self.start + self.duration + self.buffer
    }
}

impl PlacementEngine {
    /// 10 minute minimum, 5 minute grid, 2 minute trailing buffer.
    pub fn new() -> Self {
        Self {
            min_duration: Duration::minutes(10),
            snap_minutes: 5,
            buffer: Duration::minutes(2),
        }
    }

    pub fn from_settings(settings: &PlacementSettings) -> Self {
        Self::new()
            .with_min_duration(Duration::minutes(i64::from(settings.min_duration_minutes)))
            .with_snap_minutes(i64::from(settings.snap_minutes))
            .with_buffer(Duration::minutes(i64::from(settings.buffer_minutes)))
    }

    pub fn with_min_duration(mut self, min_duration: Duration) -> Self {
        self.min_duration = min_duration.max(Duration::minutes(1));
        self
    }

    pub fn with_snap_minutes(mut self, snap_minutes: i64) -> Self {
        self.snap_minutes = snap_minutes.max(1);
        self
    }

    pub fn with_buffer(mut self, buffer: Duration) -> Self {
        self.buffer = buffer.max(Duration::zero());
        self
    }

    pub fn min_duration(&self) -> Duration {
        self.min_duration
    }

    pub fn snap_minutes(&self) -> i64 {
        self.snap_minutes
    }

    /// Assign start times to `candidates`.
    ///
    /// # Arguments
    /// * `candidates` - Untimed suggestions in priority order
    /// * `gaps` - Free intervals, typically from the gap calculator
    /// * `now` - Set when planning the current day; nothing starts before it
    ///
    /// # Returns
    /// Placements sorted by start. Candidates that fit nowhere are left out.
    pub fn place(
        &self,
        candidates: &[CandidateSuggestion],
        gaps: &[TimeInterval],
        now: Option<DateTime<Utc>>,
    ) -> Vec<PlacedSuggestion> {
        let mut open: Vec<TimeInterval> = gaps.to_vec();
        open.sort_by_key(|g| g.start());

        let mut placed: Vec<PlacedSuggestion> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match self.place_one(candidate, &mut open, &placed, now) {
                Some(suggestion) => placed.push(suggestion),
                None => tracing::debug!(title = %candidate.title, "no room left for suggestion"),
            }
        }

        placed.sort_by_key(|p| p.start);
        placed
    }

    fn place_one(
        &self,
        candidate: &CandidateSuggestion,
        open: &mut Vec<TimeInterval>,
        placed: &[PlacedSuggestion],
        now: Option<DateTime<Utc>>,
    ) -> Option<PlacedSuggestion> {
        let desired = self.min_duration.max(candidate.requested_duration());

        while let Some(&gap) = open.first() {
            let Some(fit) = self.fit_in_gap(&gap, desired, placed, now) else {
                // Too small, stale, or crowded out: no later candidate can use it either.
                open.remove(0);
                continue;
            };

            match gap
                .trim_start(fit.consumed_until())
                .filter(|rest| rest.duration() >= self.min_duration)
            {
                Some(rest) => open[0] = rest,
                None => {
                    open.remove(0);
                }
            }
            return Some(PlacedSuggestion::new(candidate.clone(), fit.start, fit.duration));
        }
        None
    }

    fn fit_in_gap(
        &self,
        gap: &TimeInterval,
        desired: Duration,
        placed: &[PlacedSuggestion],
        now: Option<DateTime<Utc>>,
    ) -> Option<Fit> {
        let mut anchor = now.map_or(gap.start(), |now| gap.start().max(now));

        loop {
            let start = snap_up(anchor, self.snap_minutes);
            if start >= gap.end() || gap.end() - start < self.min_duration {
                return None;
            }

            let available = gap.end() - start;
            let buffer = if available - desired > self.buffer {
                self.buffer
            } else {
                Duration::zero()
            };
            let duration = Duration::minutes(desired.min(available - buffer).num_minutes());
            if duration < self.min_duration {
                return None;
            }

            let proposed = TimeInterval::from_ordered(start, start + duration);
            let conflict_end = placed
                .iter()
                .filter(|p| p.overlaps(&proposed))
                .map(PlacedSuggestion::end)
                .max();

            match conflict_end {
                // Strictly later than `start`, so the loop always advances.
                Some(end) => anchor = end,
                None => {
                    return Some(Fit {
                        start,
                        duration,
                        buffer,
                    })
                }
            }
        }
    }
}

impl Default for PlacementEngine {
    fn default() -> Self {
        Self::new()
    }
}
