//! Free-time detection for a single day.
//!
//! Sweeps the day's committed blocks to find the holes between them, then
//! carves quiet hours out of those holes. Whatever survives and is still
//! long enough to be useful is a gap suggestions may be placed into.

use chrono::{DateTime, Duration, Utc};

use super::day::DayContext;
use crate::interval::{total_duration, TimeInterval};

/// Default minimum gap length in minutes.
pub const DEFAULT_MIN_GAP_MINUTES: i64 = 10;

/// Detector for finding free time in a day
#[derive(Debug, Clone)]
pub struct GapCalculator {
    min_gap: Duration,
}

impl GapCalculator {
    /// Create a calculator with the default 10 minute minimum
    pub fn new() -> Self {
        Self {
            min_gap: Duration::minutes(DEFAULT_MIN_GAP_MINUTES),
        }
    }

    /// Set the minimum gap duration
    pub fn with_min_gap(mut self, min_gap: Duration) -> Self {
        self.min_gap = min_gap.max(Duration::seconds(1));
        self
    }

    pub fn min_gap(&self) -> Duration {
        self.min_gap
    }

    /// The part of `day` still open for planning at `now`.
    ///
    /// Today starts at `now`; a day that is already over has no span left.
    pub fn schedulable_span(&self, day: &DayContext, now: DateTime<Utc>) -> Option<TimeInterval> {
        day.bounds().trim_start(now)
    }

    /// Find free intervals in `day`.
    ///
    /// # Arguments
    /// * `day` - The day being planned
    /// * `blocks` - Committed busy intervals, in any order, possibly overlapping
    /// * `quiet` - Quiet-hour windows already resolved for this day
    /// * `now` - Current instant; gaps never start before it
    ///
    /// # Returns
    /// Disjoint gaps sorted by start, each at least the minimum length
    pub fn compute_gaps(
        &self,
        day: &DayContext,
        blocks: &[TimeInterval],
        quiet: &[TimeInterval],
        now: DateTime<Utc>,
    ) -> Vec<TimeInterval> {
        let Some(span) = self.schedulable_span(day, now) else {
            return Vec::new();
        };

        let mut busy: Vec<TimeInterval> = blocks
            .iter()
            .filter_map(|b| b.intersection(&span))
            .collect();
        busy.sort_by_key(|b| b.start());

        let mut gaps = Vec::new();
        let mut cursor = span.start();
        for block in &busy {
            if let Some(gap) = self.keep(cursor, block.start()) {
                gaps.push(gap);
            }
            cursor = cursor.max(block.end());
        }
        if let Some(tail) = self.keep(cursor, span.end()) {
            gaps.push(tail);
        }

        for window in quiet {
            gaps = gaps.into_iter().flat_map(|g| g.subtract(window)).collect();
        }
        gaps.retain(|g| g.duration() >= self.min_gap);
        gaps.sort_by_key(|g| g.start());
        gaps
    }

    fn keep(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<TimeInterval> {
        TimeInterval::spanning(start, end).filter(|g| g.duration() >= self.min_gap)
    }
}

impl Default for GapCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Total free minutes across a gap list
pub fn free_minutes(gaps: &[TimeInterval]) -> i64 {
    total_duration(gaps).num_minutes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::merge_adjacent;
    use chrono::{NaiveDate, TimeZone};
    use proptest::prelude::*;

    fn day() -> DayContext {
        DayContext::new(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), 0).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn iv(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeInterval {
        TimeInterval::new(start, end).unwrap()
    }

    fn night() -> Vec<TimeInterval> {
        vec![
            iv(at(0, 0) - Duration::hours(2), at(6, 0)),
            iv(at(22, 0), at(0, 0) + Duration::hours(30)),
        ]
    }

    fn before_day() -> DateTime<Utc> {
        at(0, 0) - Duration::days(1)
    }

    #[test]
    fn single_block_with_night_quiet_hours() {
        let blocks = vec![iv(at(10, 0), at(11, 0))];
        let gaps = GapCalculator::new().compute_gaps(&day(), &blocks, &night(), before_day());

        assert_eq!(gaps, vec![iv(at(6, 0), at(10, 0)), iv(at(11, 0), at(22, 0))]);
    }

    #[test]
    fn today_is_clamped_to_now() {
        let now = at(13, 17);
        let blocks = vec![iv(at(10, 0), at(11, 0)), iv(at(15, 0), at(16, 0))];
        let gaps = GapCalculator::new().compute_gaps(&day(), &blocks, &[], now);

        assert_eq!(gaps[0].start(), now);
        assert!(gaps.iter().all(|g| g.start() >= now));
        assert_eq!(gaps.len(), 2);
    }

    #[test]
    fn past_day_has_no_gaps() {
        let now = at(0, 0) + Duration::days(2);
        assert!(GapCalculator::new().compute_gaps(&day(), &[], &[], now).is_empty());
    }

    #[test]
    fn small_holes_are_dropped() {
        let blocks = vec![iv(at(9, 0), at(10, 0)), iv(at(10, 5), at(11, 0))];
        let gaps = GapCalculator::new().compute_gaps(&day(), &blocks, &night(), before_day());
        assert!(!gaps.iter().any(|g| g.start() == at(10, 0)));
    }

    #[test]
    fn hole_of_exactly_the_minimum_is_kept() {
        let blocks = vec![iv(at(9, 0), at(10, 0)), iv(at(10, 10), at(11, 0))];
        let gaps = GapCalculator::new().compute_gaps(&day(), &blocks, &night(), before_day());

        assert!(gaps.contains(&iv(at(10, 0), at(10, 10))));

        let one_short = vec![iv(at(9, 0), at(10, 0)), iv(at(10, 9), at(11, 0))];
        let gaps = GapCalculator::new().compute_gaps(&day(), &one_short, &night(), before_day());
        assert!(!gaps.iter().any(|g| g.start() == at(10, 0)));
    }

    #[test]
    fn overlapping_and_out_of_day_blocks_are_tolerated() {
        let blocks = vec![
            iv(at(12, 0), at(14, 0)),
            iv(at(9, 0), at(13, 0)),
            iv(at(0, 0) - Duration::hours(3), at(1, 0)),
            iv(at(23, 0), at(0, 0) + Duration::hours(26)),
        ];
        let gaps = GapCalculator::new().compute_gaps(&day(), &blocks, &[], before_day());
        assert_eq!(gaps, vec![iv(at(1, 0), at(9, 0)), iv(at(14, 0), at(23, 0))]);
    }

    #[test]
    fn quiet_window_inside_gap_splits_it() {
        let lunch = vec![iv(at(12, 0), at(13, 0))];
        let blocks = vec![iv(at(0, 0), at(9, 0)), iv(at(17, 0), at(23, 59))];
        let gaps = GapCalculator::new().compute_gaps(&day(), &blocks, &lunch, before_day());
        assert_eq!(gaps, vec![iv(at(9, 0), at(12, 0)), iv(at(13, 0), at(17, 0))]);
    }

    #[test]
    fn fully_busy_day_is_empty() {
        let blocks = vec![iv(at(0, 0), at(0, 0) + Duration::days(1))];
        assert!(GapCalculator::new().compute_gaps(&day(), &blocks, &[], before_day()).is_empty());
    }

    fn arb_intervals() -> impl Strategy<Value = Vec<(i64, i64)>> {
        prop::collection::vec((0i64..1440, 1i64..240), 0..8)
    }

    proptest! {
        #[test]
        fn gaps_are_disjoint_ordered_and_long_enough(blocks in arb_intervals(), quiet in arb_intervals()) {
            let base = at(0, 0);
            let to_iv = |(s, l): (i64, i64)| iv(base + Duration::minutes(s), base + Duration::minutes(s + l));
            let blocks: Vec<_> = blocks.into_iter().map(to_iv).collect();
            let quiet: Vec<_> = quiet.into_iter().map(to_iv).collect();

            let calc = GapCalculator::new();
            let gaps = calc.compute_gaps(&day(), &blocks, &quiet, before_day());

            for pair in gaps.windows(2) {
                prop_assert!(pair[0].end() <= pair[1].start());
            }
            for g in &gaps {
                prop_assert!(g.duration() >= calc.min_gap());
                prop_assert!(day().bounds().contains(g));
                prop_assert!(!blocks.iter().chain(quiet.iter()).any(|b| b.overlaps(g)));
            }
        }

        #[test]
        fn gaps_and_busy_time_cover_the_day(blocks in arb_intervals(), quiet in arb_intervals()) {
            let base = at(0, 0);
            let to_iv = |(s, l): (i64, i64)| iv(base + Duration::minutes(s), base + Duration::minutes(s + l));
            let busy: Vec<_> = blocks.into_iter().chain(quiet.clone()).map(to_iv).collect();
            let quiet: Vec<_> = quiet.into_iter().map(to_iv).collect();
            let blocks: Vec<_> = busy[..busy.len() - quiet.len()].to_vec();

            let calc = GapCalculator::new().with_min_gap(Duration::minutes(1));
            let gaps = calc.compute_gaps(&day(), &blocks, &quiet, before_day());

            let span = day().bounds();
            let clipped: Vec<_> = busy.iter().filter_map(|b| b.intersection(&span)).collect();
            let occupied = total_duration(&merge_adjacent(&clipped));
            prop_assert_eq!(total_duration(&gaps) + occupied, span.duration());
        }
    }
}
