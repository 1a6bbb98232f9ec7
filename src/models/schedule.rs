use crate::constants::{MINUTES_PER_DAY, MIN_SCHEDULE_SECS, SECS_PER_DAY};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A weekly recurring block window bound to one configuration ("mode").
///
/// Only the hour and minute of `start_time`/`end_time` matter. When
/// `end_time` is earlier than `start_time` the window runs past midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: String,
    /// Name of the configuration this schedule blocks.
    pub config_name: String,
    /// Day numbers, 1 = Sunday ... 7 = Saturday.
    pub weekdays: BTreeSet<u8>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Inactive entries are kept but never evaluated.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ScheduleEntry {
    /// Create a new active schedule with a fresh id.
    pub fn new(
        config_name: &str,
        weekdays: BTreeSet<u8>,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            config_name: config_name.to_string(),
            weekdays,
            start_time,
            end_time,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn start_minutes(&self) -> u32 {
        minute_of_day(self.start_time)
    }

    pub fn end_minutes(&self) -> u32 {
        minute_of_day(self.end_time)
    }

    /// True when the window wraps past midnight.
    pub fn crosses_midnight(&self) -> bool {
        self.end_minutes() < self.start_minutes()
    }

    /// Window length in seconds, with both ends placed on the same day and
    /// a day added when the end comes before the start.
    pub fn duration_secs(&self) -> i64 {
        let start = i64::from(self.start_minutes()) * 60;
        let end = i64::from(self.end_minutes()) * 60;
        let raw = end - start;
        if raw < 0 {
            raw + SECS_PER_DAY
        } else {
            raw
        }
    }

    /// At least one weekday and a window of five minutes or more.
    pub fn is_valid(&self) -> bool {
        !self.weekdays.is_empty() && self.duration_secs() >= MIN_SCHEDULE_SECS
    }

    /// Check if this schedule applies to the given weekday (1 = Sunday, 7 = Saturday).
    pub fn applies_to_day(&self, day: u8) -> bool {
        self.weekdays.contains(&day)
    }

    /// Check if a minute-of-day falls inside the window. Start inclusive, end exclusive.
    pub fn is_time_in_range(&self, minutes: u32) -> bool {
        let start = self.start_minutes();
        let end = self.end_minutes();
        if end >= start {
            start <= minutes && minutes < end
        } else {
            minutes >= start || minutes < end
        }
    }

    /// Whether this schedule should be blocking at `at`.
    pub fn should_be_active_at(&self, at: NaiveDateTime) -> bool {
        if !self.is_active || !self.is_valid() {
            return false;
        }
        if !self.applies_to_day(weekday_number(at.date())) {
            return false;
        }
        self.is_time_in_range(minute_of_day(at.time()))
    }

    /// The first start instant strictly after `after`, if the schedule has any weekday.
    pub fn next_start_after(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        let start = NaiveTime::from_hms_opt(self.start_time.hour(), self.start_time.minute(), 0)?;
        (0..=7)
            .filter_map(|offset| after.date().checked_add_signed(TimeDelta::days(offset)))
            .filter(|date| self.applies_to_day(weekday_number(*date)))
            .map(|date| date.and_time(start))
            .find(|candidate| *candidate > after)
    }

    /// "HH:MM - HH:MM" label for logs and UI.
    pub fn window_label(&self) -> String {
        format!(
            "{} - {}",
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

/// Minutes since midnight, seconds ignored.
pub fn minute_of_day(time: NaiveTime) -> u32 {
    (time.hour() * 60 + time.minute()) % MINUTES_PER_DAY
}

/// Weekday number in schedule encoding: Sunday = 1 ... Saturday = 7.
pub fn weekday_number(date: NaiveDate) -> u8 {
    match date.weekday() {
        Weekday::Sun => 1,
        Weekday::Mon => 2,
        Weekday::Tue => 3,
        Weekday::Wed => 4,
        Weekday::Thu => 5,
        Weekday::Fri => 6,
        Weekday::Sat => 7,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // 2024-03-03 is a Sunday
    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn schedule(days: &[u8], start: NaiveTime, end: NaiveTime) -> ScheduleEntry {
        ScheduleEntry::new("Work", days.iter().copied().collect(), start, end)
    }

    #[test]
    fn test_new_creates_active_schedule_with_id() {
        let s = schedule(&[2, 4, 6], hm(9, 0), hm(10, 0));
        assert!(!s.id.is_empty());
        assert!(s.is_active);
        assert_eq!(s.config_name, "Work");
        assert_ne!(s.id, schedule(&[2], hm(9, 0), hm(10, 0)).id);
    }

    #[test]
    fn test_weekday_number_starts_on_sunday() {
        assert_eq!(weekday_number(at(3, 0, 0).date()), 1);
        assert_eq!(weekday_number(at(4, 0, 0).date()), 2);
        assert_eq!(weekday_number(at(9, 0, 0).date()), 7);
    }

    #[test]
    fn test_duration_wraps_past_midnight() {
        assert_eq!(schedule(&[1], hm(9, 0), hm(10, 0)).duration_secs(), 3600);
        assert_eq!(schedule(&[1], hm(22, 0), hm(2, 0)).duration_secs(), 4 * 3600);
        assert_eq!(schedule(&[1], hm(9, 0), hm(9, 0)).duration_secs(), 0);
    }

    #[test]
    fn test_is_valid_requires_five_minutes() {
        assert!(schedule(&[1], hm(9, 0), hm(9, 5)).is_valid());
        assert!(!schedule(&[1], hm(9, 0), hm(9, 4)).is_valid());
        assert!(!schedule(&[1], hm(9, 0), hm(9, 0)).is_valid());
        assert!(schedule(&[1], hm(23, 58), hm(0, 3)).is_valid());
    }

    #[test]
    fn test_seconds_are_ignored() {
        let mut s = schedule(&[1], hm(9, 0), hm(9, 5));
        s.start_time = NaiveTime::from_hms_opt(9, 0, 59).unwrap();
        assert_eq!(s.duration_secs(), 300);
        assert!(s.is_valid());
    }

    #[test]
    fn test_is_time_in_range_same_day() {
        let s = schedule(&[1], hm(9, 0), hm(12, 0));
        assert!(s.is_time_in_range(9 * 60));
        assert!(s.is_time_in_range(11 * 60 + 59));
        assert!(!s.is_time_in_range(8 * 60 + 59));
        assert!(!s.is_time_in_range(12 * 60)); // End time is exclusive
    }

    #[test]
    fn test_is_time_in_range_crossing_midnight() {
        let s = schedule(&[1], hm(22, 0), hm(2, 0));
        assert!(s.crosses_midnight());
        assert!(s.is_time_in_range(22 * 60));
        assert!(s.is_time_in_range(23 * 60 + 59));
        assert!(s.is_time_in_range(0));
        assert!(s.is_time_in_range(60 + 59));
        assert!(!s.is_time_in_range(2 * 60));
        assert!(!s.is_time_in_range(12 * 60));
    }

    #[test]
    fn test_should_be_active_at() {
        // Mon/Wed/Fri
        let mut s = schedule(&[2, 4, 6], hm(9, 0), hm(10, 0));

        assert!(s.should_be_active_at(at(4, 9, 30)));
        assert!(!s.should_be_active_at(at(5, 9, 30))); // Tuesday
        assert!(!s.should_be_active_at(at(4, 10, 0)));

        s.is_active = false;
        assert!(!s.should_be_active_at(at(4, 9, 30)));
    }

    #[test]
    fn test_should_be_active_uses_current_weekday_after_midnight() {
        // Sunday only, 22:00-02:00: the early-Monday tail does not match Monday
        let s = schedule(&[1], hm(22, 0), hm(2, 0));
        assert!(s.should_be_active_at(at(3, 23, 0)));
        assert!(s.should_be_active_at(at(3, 1, 0)));
        assert!(!s.should_be_active_at(at(4, 1, 0)));
    }

    #[test]
    fn test_invalid_schedule_never_active() {
        let s = schedule(&[1, 2, 3, 4, 5, 6, 7], hm(9, 0), hm(9, 3));
        assert!(!s.should_be_active_at(at(4, 9, 1)));
    }

    #[test]
    fn test_next_start_after() {
        let s = schedule(&[2, 4, 6], hm(9, 0), hm(10, 0));
        assert_eq!(s.next_start_after(at(4, 8, 0)), Some(at(4, 9, 0)));
        assert_eq!(s.next_start_after(at(4, 9, 0)), Some(at(6, 9, 0)));
        // Saturday evening rolls to Monday
        assert_eq!(s.next_start_after(at(9, 20, 0)), Some(at(11, 9, 0)));

        let empty = schedule(&[], hm(9, 0), hm(10, 0));
        assert_eq!(empty.next_start_after(at(4, 8, 0)), None);
    }

    #[test]
    fn test_serialized_weekdays_are_deduplicated() {
        let json = r#"{
            "id": "abc",
            "configName": "Work",
            "weekdays": [2, 4, 2, 6],
            "startTime": "09:00:00",
            "endTime": "10:00:00",
            "isActive": true,
            "createdAt": "2024-03-01T12:00:00Z"
        }"#;
        let s: ScheduleEntry = serde_json::from_str(json).unwrap();
        assert_eq!(s.weekdays.len(), 3);
        assert_eq!(s.window_label(), "09:00 - 10:00");
    }

    proptest! {
        #[test]
        fn prop_empty_weekdays_never_valid(start in 0u32..1440, end in 0u32..1440) {
            let s = schedule(&[], hm(start / 60, start % 60), hm(end / 60, end % 60));
            prop_assert!(!s.is_valid());
        }

        #[test]
        fn prop_window_is_half_open(start in 0u32..1440, len in 5u32..1440) {
            let end = (start + len) % 1440;
            let s = schedule(&[1, 2, 3, 4, 5, 6, 7], hm(start / 60, start % 60), hm(end / 60, end % 60));
            prop_assert!(s.is_valid());
            prop_assert!(s.should_be_active_at(at(5, start / 60, start % 60)));
            prop_assert!(!s.should_be_active_at(at(5, end / 60, end % 60)));
        }
    }
}
