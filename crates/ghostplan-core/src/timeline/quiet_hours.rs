//! Recurring quiet hours.
//!
//! A quiet window is a local time-of-day range during which nothing may be
//! suggested. Windows whose end is earlier than their start run overnight,
//! so `22:00-06:00` covers both the early morning and the late evening of
//! any given day.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::day::DayContext;
use crate::error::ValidationError;
use crate::interval::TimeInterval;

/// One recurring quiet window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietWindow {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    /// Days on which the window begins. Empty means every day.
    #[serde(default)]
    pub weekdays: Vec<Weekday>,
}

impl QuietWindow {
    pub fn daily(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            start,
            end,
            weekdays: Vec::new(),
        }
    }

    pub fn overnight(&self) -> bool {
        self.end < self.start
    }

    fn starts_on(&self, date: NaiveDate) -> bool {
        self.weekdays.is_empty() || self.weekdays.contains(&date.weekday())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.start == self.end {
            return Err(ValidationError::InvalidValue {
                field: "quiet_hours.windows".into(),
                message: format!("window {} has no length", self.start.format("%H:%M")),
            });
        }
        Ok(())
    }

    /// The concrete occurrence that begins on `date`, if the window is active that day.
    fn occurrence(&self, day: &DayContext, date: NaiveDate) -> Option<TimeInterval> {
        if self.start == self.end || !self.starts_on(date) {
            return None;
        }
        let start = day.local_instant(date, self.start);
        let end_date = if self.overnight() {
            date + Duration::days(1)
        } else {
            date
        };
        TimeInterval::new(start, day.local_instant(end_date, self.end)).ok()
    }
}

/// The user's full set of quiet windows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHoursPolicy {
    #[serde(default)]
    pub windows: Vec<QuietWindow>,
}

impl QuietHoursPolicy {
    pub fn new(windows: Vec<QuietWindow>) -> Self {
        Self { windows }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.windows.iter().try_for_each(QuietWindow::validate)
    }

    /// Resolve every window to the concrete intervals touching `day`.
    ///
    /// Overnight windows that began the previous evening are included, so
    /// the early hours of `day` are covered as well.
    pub fn resolve(&self, day: &DayContext) -> Vec<TimeInterval> {
        let bounds = day.bounds();
        let previous = day.date - Duration::days(1);

        let mut resolved: Vec<TimeInterval> = self
            .windows
            .iter()
            .flat_map(|w| [w.occurrence(day, previous), w.occurrence(day, day.date)])
            .flatten()
            .filter(|i| i.overlaps(&bounds))
            .collect();
        resolved.sort_by_key(|i| i.start());
        resolved
    }
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn monday() -> DayContext {
        DayContext::new(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), 0).unwrap()
    }

    #[test]
    fn overnight_window_covers_both_ends_of_the_day() {
        let policy = QuietHoursPolicy::new(vec![QuietWindow::daily(t(22, 0), t(6, 0))]);
        let windows = policy.resolve(&monday());

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].start(), Utc.with_ymd_and_hms(2026, 3, 1, 22, 0, 0).unwrap());
        assert_eq!(windows[0].end(), Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap());
        assert_eq!(windows[1].start(), Utc.with_ymd_and_hms(2026, 3, 2, 22, 0, 0).unwrap());
        assert_eq!(windows[1].end(), Utc.with_ymd_and_hms(2026, 3, 3, 6, 0, 0).unwrap());
    }

    #[test]
    fn weekday_filter_applies_to_start_day() {
        let lunch = QuietWindow {
            start: t(12, 0),
            end: t(13, 0),
            weekdays: vec![Weekday::Tue],
        };
        let policy = QuietHoursPolicy::new(vec![lunch]);
        assert!(policy.resolve(&monday()).is_empty());

        let tuesday = DayContext::new(NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(), 0).unwrap();
        assert_eq!(policy.resolve(&tuesday).len(), 1);
    }

    #[test]
    fn zero_length_window_is_invalid() {
        let policy = QuietHoursPolicy::new(vec![QuietWindow::daily(t(9, 0), t(9, 0))]);
        assert!(policy.validate().is_err());
        assert!(policy.resolve(&monday()).is_empty());
    }

    #[test]
    fn parses_hh_mm_from_toml() {
        let policy: QuietHoursPolicy = toml::from_str(
            r#"
            [[windows]]
            start = "22:30"
            end = "07:00"
            weekdays = ["Mon", "Fri"]
            "#,
        )
        .unwrap();
        assert_eq!(policy.windows[0].start, t(22, 30));
        assert_eq!(policy.windows[0].weekdays, vec![Weekday::Mon, Weekday::Fri]);
    }
}
