//! The day a placement pass works on.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::interval::TimeInterval;

const MAX_OFFSET_MINUTES: i32 = 18 * 60;

/// A calendar date plus the fixed UTC offset the user lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayContext {
    pub date: NaiveDate,
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl DayContext {
    pub fn new(date: NaiveDate, utc_offset_minutes: i32) -> Result<Self, ValidationError> {
        if utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(ValidationError::InvalidValue {
                field: "utc_offset_minutes".into(),
                message: format!("{utc_offset_minutes} is outside +/-{MAX_OFFSET_MINUTES}"),
            });
        }
        Ok(Self {
            date,
            utc_offset_minutes,
        })
    }

    /// The local date containing `now`.
    pub fn containing(now: DateTime<Utc>, utc_offset_minutes: i32) -> Result<Self, ValidationError> {
        let local = now + Duration::minutes(i64::from(utc_offset_minutes));
        Self::new(local.date_naive(), utc_offset_minutes)
    }

    /// Local midnight of `date` expressed in UTC.
    pub fn local_midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        let naive = date.and_time(chrono::NaiveTime::MIN)
            - Duration::minutes(i64::from(self.utc_offset_minutes));
        Utc.from_utc_datetime(&naive)
    }

    /// Local `date` + `time` expressed in UTC.
    pub fn local_instant(&self, date: NaiveDate, time: chrono::NaiveTime) -> DateTime<Utc> {
        let naive = date.and_time(time) - Duration::minutes(i64::from(self.utc_offset_minutes));
        Utc.from_utc_datetime(&naive)
    }

    /// Midnight to next midnight.
    pub fn bounds(&self) -> TimeInterval {
        let start = self.local_midnight(self.date);
        TimeInterval::from_ordered(start, start + Duration::days(1))
    }

    pub fn is_today(&self, now: DateTime<Utc>) -> bool {
        self.bounds().contains_instant(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_follow_the_offset() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let utc = DayContext::new(date, 0).unwrap();
        assert_eq!(utc.bounds().start(), Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap());
        assert_eq!(utc.bounds().duration_minutes(), 24 * 60);

        let tokyo = DayContext::new(date, 9 * 60).unwrap();
        assert_eq!(tokyo.bounds().start(), Utc.with_ymd_and_hms(2026, 3, 1, 15, 0, 0).unwrap());
    }

    #[test]
    fn containing_uses_local_date() {
        let late_utc = Utc.with_ymd_and_hms(2026, 3, 2, 23, 30, 0).unwrap();
        let day = DayContext::containing(late_utc, 60).unwrap();
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2026, 3, 3).unwrap());
        assert!(day.is_today(late_utc));
    }

    #[test]
    fn rejects_absurd_offsets() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert!(DayContext::new(date, 20 * 60).is_err());
    }
}
