//! Half-open time intervals and the arithmetic the planner needs on them.
//!
//! A [`TimeInterval`] always satisfies `end > start`; the invariant is
//! checked at construction and on deserialization, so code downstream never
//! sees a zero or negative span.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A half-open interval `[start, end)` with `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct TimeInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawInterval> for TimeInterval {
    type Error = ValidationError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        TimeInterval::new(raw.start, raw.end)
    }
}

impl TimeInterval {
    /// Create an interval, rejecting `end <= start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Create an interval from a start and a positive length.
    pub fn starting_at(start: DateTime<Utc>, length: Duration) -> Result<Self, ValidationError> {
        Self::new(start, start + length)
    }

    /// Build an interval from bounds already known to be ordered.
    /// Returns `None` for an empty or inverted span.
    pub(crate) fn spanning(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    /// Caller guarantees `end > start`.
    pub(crate) fn from_ordered(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(end > start);
        Self { start, end }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Get duration in whole minutes
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// True when the two intervals share any instant.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn contains_instant(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    pub fn intersection(&self, other: &TimeInterval) -> Option<TimeInterval> {
        Self::spanning(self.start.max(other.start), self.end.min(other.end))
    }

    /// Remove `other` from `self`.
    ///
    /// Yields nothing when `other` covers `self`, one piece when it trims an
    /// edge or does not overlap at all, and two pieces when it sits strictly
    /// inside.
    pub fn subtract(&self, other: &TimeInterval) -> Vec<TimeInterval> {
        if !self.overlaps(other) {
            return vec![*self];
        }
        let mut pieces = Vec::with_capacity(2);
        if let Some(before) = Self::spanning(self.start, other.start) {
            pieces.push(before);
        }
        if let Some(after) = Self::spanning(other.end, self.end) {
            pieces.push(after);
        }
        pieces
    }

    /// Drop everything before `at`. `None` when nothing is left.
    pub fn trim_start(&self, at: DateTime<Utc>) -> Option<TimeInterval> {
        Self::spanning(self.start.max(at), self.end)
    }
}

/// Merge overlapping or touching intervals into a sorted, disjoint list.
pub fn merge_adjacent(intervals: &[TimeInterval]) -> Vec<TimeInterval> {
    let mut sorted = intervals.to_vec();
    sorted.sort_by_key(|i| i.start);

    let mut merged: Vec<TimeInterval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

/// Sum of the durations of `intervals`.
pub fn total_duration(intervals: &[TimeInterval]) -> Duration {
    intervals
        .iter()
        .fold(Duration::zero(), |acc, i| acc + i.duration())
}

/// Round `at` up to the next multiple of `step_minutes` on the epoch grid.
/// Instants already on the grid are returned unchanged.
pub fn snap_up(at: DateTime<Utc>, step_minutes: i64) -> DateTime<Utc> {
    let step = step_minutes.max(1) * 60;
    let secs = at.timestamp();
    let nanos = at.timestamp_subsec_nanos();
    let rem = secs.rem_euclid(step);
    if rem == 0 && nanos == 0 {
        return at;
    }
    let floor = at - Duration::seconds(rem) - Duration::nanoseconds(i64::from(nanos));
    floor + Duration::seconds(step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn iv(sh: u32, sm: u32, eh: u32, em: u32) -> TimeInterval {
        TimeInterval::new(at(sh, sm), at(eh, em)).unwrap()
    }

    #[test]
    fn rejects_inverted_and_empty_ranges() {
        assert!(TimeInterval::new(at(10, 0), at(10, 0)).is_err());
        let err = TimeInterval::new(at(11, 0), at(10, 0)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTimeRange { .. }));
    }

    #[test]
    fn deserialization_enforces_ordering() {
        let ok: TimeInterval = serde_json::from_str(
            r#"{"start":"2026-03-02T10:00:00Z","end":"2026-03-02T11:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(ok.duration_minutes(), 60);

        let bad = serde_json::from_str::<TimeInterval>(
            r#"{"start":"2026-03-02T11:00:00Z","end":"2026-03-02T10:00:00Z"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn overlap_is_half_open() {
        assert!(iv(9, 0, 10, 0).overlaps(&iv(9, 30, 11, 0)));
        assert!(!iv(9, 0, 10, 0).overlaps(&iv(10, 0, 11, 0)));
    }

    #[test]
    fn subtract_cases() {
        let day = iv(8, 0, 18, 0);
        assert_eq!(day.subtract(&iv(12, 0, 13, 0)), vec![iv(8, 0, 12, 0), iv(13, 0, 18, 0)]);
        assert_eq!(day.subtract(&iv(7, 0, 9, 0)), vec![iv(9, 0, 18, 0)]);
        assert_eq!(day.subtract(&iv(17, 0, 19, 0)), vec![iv(8, 0, 17, 0)]);
        assert_eq!(day.subtract(&iv(19, 0, 20, 0)), vec![day]);
        assert!(day.subtract(&iv(7, 0, 19, 0)).is_empty());
    }

    #[test]
    fn merge_joins_touching_and_overlapping() {
        let merged = merge_adjacent(&[iv(13, 0, 14, 0), iv(9, 0, 10, 0), iv(10, 0, 11, 0), iv(10, 30, 12, 0)]);
        assert_eq!(merged, vec![iv(9, 0, 12, 0), iv(13, 0, 14, 0)]);
    }

    #[test]
    fn snap_up_to_five_minute_grid() {
        assert_eq!(snap_up(at(9, 0), 5), at(9, 0));
        assert_eq!(snap_up(at(9, 1), 5), at(9, 5));
        assert_eq!(snap_up(at(9, 58), 5), at(10, 0));
        let with_seconds = at(9, 5) + Duration::seconds(1);
        assert_eq!(snap_up(with_seconds, 5), at(9, 10));
        let with_nanos = at(9, 5) + Duration::nanoseconds(10);
        assert_eq!(snap_up(with_nanos, 5), at(9, 10));
    }

    proptest! {
        #[test]
        fn subtract_pieces_stay_inside_and_avoid_the_hole(
            a in 0i64..600, alen in 1i64..600, b in 0i64..600, blen in 1i64..600,
        ) {
            let base = at(0, 0);
            let x = TimeInterval::starting_at(base + Duration::minutes(a), Duration::minutes(alen)).unwrap();
            let y = TimeInterval::starting_at(base + Duration::minutes(b), Duration::minutes(blen)).unwrap();
            let pieces = x.subtract(&y);
            prop_assert!(pieces.len() <= 2);
            for p in &pieces {
                prop_assert!(x.contains(p));
                prop_assert!(!p.overlaps(&y));
            }
            let removed = x.intersection(&y).map(|i| i.duration()).unwrap_or_else(Duration::zero);
            prop_assert_eq!(total_duration(&pieces) + removed, x.duration());
        }

        #[test]
        fn snapped_instant_is_on_grid_and_not_earlier(offset in 0i64..100_000) {
            let t = at(0, 0) + Duration::seconds(offset);
            let s = snap_up(t, 5);
            prop_assert!(s >= t);
            prop_assert!(s - t < Duration::minutes(5));
            prop_assert_eq!(s.timestamp() % 300, 0);
        }
    }
}
