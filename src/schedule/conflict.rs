use super::store::ScheduleStore;
use crate::error::AppResult;
use crate::models::{minute_of_day, ScheduleEntry};
use chrono::NaiveTime;
use log::debug;
use std::collections::BTreeSet;

/// Whether two weekly windows, given as minute-of-day pairs, share any minute.
///
/// Windows are half-open. A window with `end < start` wraps past midnight.
pub fn windows_overlap(s1: u32, e1: u32, s2: u32, e2: u32) -> bool {
    let first_wraps = e1 < s1;
    let second_wraps = e2 < s2;

    match (first_wraps, second_wraps) {
        (false, false) => s1 < e2 && s2 < e1,
        (true, true) => true,
        _ => s1 < e2 || s2 < e1,
    }
}

/// Save-time check against overlapping schedules of other configurations.
pub struct ConflictChecker<'a> {
    store: &'a ScheduleStore,
    ignored_id: Option<&'a str>,
}

impl<'a> ConflictChecker<'a> {
    pub fn new(store: &'a ScheduleStore) -> Self {
        Self { store, ignored_id: None }
    }

    /// Skip the stored copy of the schedule being edited.
    #[must_use]
    pub fn ignoring_schedule(mut self, schedule_id: Option<&'a str>) -> Self {
        self.ignored_id = schedule_id;
        self
    }

    pub fn has_conflict(
        &self,
        weekdays: &BTreeSet<u8>,
        start: NaiveTime,
        end: NaiveTime,
        excluding_config_name: &str,
    ) -> AppResult<bool> {
        Ok(self
            .find_conflict(weekdays, start, end, excluding_config_name)?
            .is_some())
    }

    /// The first active, valid schedule of another live configuration that
    /// shares a weekday and overlaps the candidate window.
    pub fn find_conflict(
        &self,
        weekdays: &BTreeSet<u8>,
        start: NaiveTime,
        end: NaiveTime,
        excluding_config_name: &str,
    ) -> AppResult<Option<ScheduleEntry>> {
        let (s1, e1) = (minute_of_day(start), minute_of_day(end));

        let conflict = self
            .store
            .load_active()?
            .entries
            .into_iter()
            .filter(|entry| entry.is_valid() && entry.config_name != excluding_config_name)
            .filter(|entry| self.ignored_id != Some(entry.id.as_str()))
            .filter(|entry| !entry.weekdays.is_disjoint(weekdays))
            .find(|entry| windows_overlap(s1, e1, entry.start_minutes(), entry.end_minutes()));

        if let Some(entry) = &conflict {
            debug!(
                "Candidate window overlaps schedule {} of '{}' ({})",
                entry.id,
                entry.config_name,
                entry.window_label()
            );
        }
        Ok(conflict)
    }
}
