use super::{
    BlockStateRepository, ConfigurationRegistry, DailyTotalsRepository, OverrideRepository,
    ScheduleRepository,
};
use crate::error::AppResult;
use crate::models::{AppSelection, BlockState, ScheduleEntry};
use chrono::{NaiveDate, TimeDelta};
use log::warn;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    schedules: Vec<ScheduleEntry>,
    daily: BTreeMap<NaiveDate, TimeDelta>,
    overrides: BTreeSet<(String, NaiveDate)>,
    block_state: BlockState,
    /// `None` marks a configuration whose selection is unreadable.
    modes: BTreeMap<String, Option<AppSelection>>,
}

/// In-memory implementation of every repository.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a configuration whose stored selection cannot be decoded.
    pub fn insert_broken_mode(&self, config_name: &str) {
        self.lock().modes.insert(config_name.to_string(), None);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("MemoryStore mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl ScheduleRepository for MemoryStore {
    fn load_all(&self) -> AppResult<Vec<ScheduleEntry>> {
        Ok(self.lock().schedules.clone())
    }

    fn save_all(&self, entries: &[ScheduleEntry]) -> AppResult<()> {
        self.lock().schedules = entries.to_vec();
        Ok(())
    }
}

impl DailyTotalsRepository for MemoryStore {
    fn add_to_day(&self, day: NaiveDate, amount: TimeDelta) -> AppResult<()> {
        let mut inner = self.lock();
        let total = inner.daily.entry(day).or_insert_with(TimeDelta::zero);
        *total = *total + amount;
        Ok(())
    }

    fn day_total(&self, day: NaiveDate) -> AppResult<TimeDelta> {
        Ok(self.lock().daily.get(&day).copied().unwrap_or_else(TimeDelta::zero))
    }

    fn all_totals(&self) -> AppResult<Vec<(NaiveDate, TimeDelta)>> {
        Ok(self.lock().daily.iter().rev().map(|(day, total)| (*day, *total)).collect())
    }
}

impl OverrideRepository for MemoryStore {
    fn mark(&self, schedule_id: &str, day: NaiveDate) -> AppResult<()> {
        self.lock().overrides.insert((schedule_id.to_string(), day));
        Ok(())
    }

    fn is_marked(&self, schedule_id: &str, day: NaiveDate) -> AppResult<bool> {
        Ok(self.lock().overrides.contains(&(schedule_id.to_string(), day)))
    }

    fn purge_before(&self, day: NaiveDate) -> AppResult<usize> {
        let mut inner = self.lock();
        let before = inner.overrides.len();
        inner.overrides.retain(|(_, marked)| *marked >= day);
        Ok(before - inner.overrides.len())
    }
}

impl BlockStateRepository for MemoryStore {
    fn load_block_state(&self) -> AppResult<BlockState> {
        Ok(self.lock().block_state.clone())
    }

    fn save_block_state(&self, state: &BlockState) -> AppResult<()> {
        self.lock().block_state = state.clone();
        Ok(())
    }

    fn clear_block_state(&self) -> AppResult<()> {
        self.lock().block_state = BlockState::default();
        Ok(())
    }
}

impl ConfigurationRegistry for MemoryStore {
    fn exists(&self, config_name: &str) -> AppResult<bool> {
        Ok(self.lock().modes.contains_key(config_name))
    }

    fn app_selection(&self, config_name: &str) -> AppResult<Option<AppSelection>> {
        Ok(self.lock().modes.get(config_name).cloned().flatten())
    }

    fn save_mode(&self, config_name: &str, selection: &AppSelection) -> AppResult<()> {
        self.lock()
            .modes
            .insert(config_name.to_string(), Some(selection.clone()));
        Ok(())
    }

    fn delete_mode(&self, config_name: &str) -> AppResult<bool> {
        Ok(self.lock().modes.remove(config_name).is_some())
    }
}
