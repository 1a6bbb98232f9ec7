//! "Starts soon" reminders ahead of schedule windows.

use crate::models::ScheduleEntry;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use log::debug;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub schedule_id: String,
    pub config_name: String,
    pub starts_at: NaiveDateTime,
    pub title: String,
    pub body: String,
}

/// Decides which schedules are about to start and remembers what was already sent.
pub struct ReminderPlanner {
    lead: TimeDelta,
    sent: HashSet<(String, NaiveDate)>,
}

impl ReminderPlanner {
    pub fn new(lead_minutes: u32) -> Self {
        Self {
            lead: TimeDelta::minutes(i64::from(lead_minutes)),
            sent: HashSet::new(),
        }
    }

    /// Reminders for schedules starting within the lead window, at most one
    /// per schedule and start day.
    pub fn due(&mut self, schedules: &[ScheduleEntry], now: NaiveDateTime) -> Vec<Reminder> {
        let today = now.date();
        self.sent.retain(|(_, day)| *day >= today);

        let mut reminders = Vec::new();
        for entry in schedules.iter().filter(|e| e.is_active && e.is_valid()) {
            let Some(starts_at) = entry.next_start_after(now) else {
                continue;
            };
            let until = starts_at - now;
            if until > self.lead {
                continue;
            }
            if !self.sent.insert((entry.id.clone(), starts_at.date())) {
                continue;
            }

            let minutes = (until.num_seconds() + 59) / 60;
            debug!("Schedule {} starts in {minutes} min, reminding", entry.id);
            reminders.push(Reminder {
                schedule_id: entry.id.clone(),
                config_name: entry.config_name.clone(),
                starts_at,
                title: "Schedule Starting Soon".to_string(),
                body: format!("Your '{}' schedule starts in {minutes} minutes", entry.config_name),
            });
        }
        reminders
    }
}

/// The notice sent when a schedule's window opens.
pub fn starting_now(entry: &ScheduleEntry, at: NaiveDateTime) -> Reminder {
    Reminder {
        schedule_id: entry.id.clone(),
        config_name: entry.config_name.clone(),
        starts_at: at,
        title: "Schedule Starting".to_string(),
        body: format!("Your '{}' schedule is starting now", entry.config_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{hm, ymd};

    fn monday_at(h: u32, m: u32) -> NaiveDateTime {
        ymd(2024, 3, 4).and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_reminds_once_inside_lead_window() {
        let mut planner = ReminderPlanner::new(10);
        let work = ScheduleEntry::new("Work", [2].into(), hm(9, 0), hm(10, 0));
        let schedules = vec![work.clone()];

        assert!(planner.due(&schedules, monday_at(8, 49)).is_empty());

        let due = planner.due(&schedules, monday_at(8, 50));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].schedule_id, work.id);
        assert_eq!(due[0].starts_at, monday_at(9, 0));
        assert_eq!(due[0].body, "Your 'Work' schedule starts in 10 minutes");

        assert!(planner.due(&schedules, monday_at(8, 55)).is_empty());
    }

    #[test]
    fn test_reminds_across_midnight() {
        let mut planner = ReminderPlanner::new(10);
        // Tuesday 00:05 start, checked Monday 23:58
        let late = ScheduleEntry::new("Sleep", [3].into(), hm(0, 5), hm(6, 0));

        let due = planner.due(&[late], monday_at(23, 58));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].starts_at, ymd(2024, 3, 5).and_hms_opt(0, 5, 0).unwrap());
        assert!(due[0].body.contains("7 minutes"));
    }

    #[test]
    fn test_starting_now_notice() {
        let work = ScheduleEntry::new("Work", [2].into(), hm(9, 0), hm(10, 0));

        let notice = starting_now(&work, monday_at(9, 0));
        assert_eq!(notice.schedule_id, work.id);
        assert_eq!(notice.title, "Schedule Starting");
        assert_eq!(notice.body, "Your 'Work' schedule is starting now");
    }

    #[test]
    fn test_skips_inactive_and_invalid() {
        let mut planner = ReminderPlanner::new(10);
        let mut paused = ScheduleEntry::new("Work", [2].into(), hm(9, 0), hm(10, 0));
        paused.is_active = false;
        let empty_days = ScheduleEntry::new("Gym", [].into(), hm(9, 0), hm(10, 0));

        assert!(planner.due(&[paused, empty_days], monday_at(8, 55)).is_empty());
    }
}
