use crate::error::AppResult;
use crate::store::OverrideRepository;
use chrono::NaiveDate;
use log::info;
use std::sync::Arc;

/// Per-day suppression of individual schedules.
///
/// A mark only covers the day it was made for; the schedule itself stays
/// active and is evaluated normally from the next day on.
pub struct TodayOverrideLedger {
    repo: Arc<dyn OverrideRepository>,
}

impl TodayOverrideLedger {
    pub fn new(repo: Arc<dyn OverrideRepository>) -> Self {
        Self { repo }
    }

    pub fn mark(&self, schedule_id: &str, day: NaiveDate) -> AppResult<()> {
        info!("Schedule {schedule_id} disabled for {day}");
        self.repo.mark(schedule_id, day)
    }

    pub fn is_disabled(&self, schedule_id: &str, day: NaiveDate) -> AppResult<bool> {
        self.repo.is_marked(schedule_id, day)
    }

    /// Drop marks for days before `today`. Stale marks are harmless, this only bounds storage.
    pub fn purge_before(&self, today: NaiveDate) -> AppResult<usize> {
        let removed = self.repo.purge_before(today)?;
        if removed > 0 {
            info!("Purged {removed} stale schedule override(s)");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_utils::ymd;

    #[test]
    fn test_mark_applies_to_one_day_only() {
        let ledger = TodayOverrideLedger::new(Arc::new(MemoryStore::new()));
        let monday = ymd(2024, 3, 4);

        ledger.mark("s1", monday).unwrap();

        assert!(ledger.is_disabled("s1", monday).unwrap());
        assert!(!ledger.is_disabled("s1", ymd(2024, 3, 5)).unwrap());
        assert!(!ledger.is_disabled("s2", monday).unwrap());
    }

    #[test]
    fn test_purge_before_keeps_today() {
        let ledger = TodayOverrideLedger::new(Arc::new(MemoryStore::new()));
        ledger.mark("s1", ymd(2024, 3, 3)).unwrap();
        ledger.mark("s1", ymd(2024, 3, 4)).unwrap();

        assert_eq!(ledger.purge_before(ymd(2024, 3, 4)).unwrap(), 1);
        assert!(ledger.is_disabled("s1", ymd(2024, 3, 4)).unwrap());
        assert_eq!(ledger.purge_before(ymd(2024, 3, 4)).unwrap(), 0);
    }
}
