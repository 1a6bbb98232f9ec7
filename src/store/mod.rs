//! Typed persistence seams.
//!
//! Each component of the engine talks to one of these traits. [`SqliteStore`]
//! implements all of them over a single database; [`MemoryStore`] is the
//! in-memory counterpart used by tests and simulations.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::AppResult;
use crate::models::{AppSelection, BlockState, ScheduleEntry};
use chrono::{NaiveDate, TimeDelta};
use std::sync::Arc;

/// The full schedule collection, stored and replaced as one unit.
pub trait ScheduleRepository: Send + Sync {
    /// All stored entries in storage order. Undecodable data reads as empty.
    fn load_all(&self) -> AppResult<Vec<ScheduleEntry>>;
    fn save_all(&self, entries: &[ScheduleEntry]) -> AppResult<()>;
}

/// Blocked time per calendar day. Additive only.
pub trait DailyTotalsRepository: Send + Sync {
    fn add_to_day(&self, day: NaiveDate, amount: TimeDelta) -> AppResult<()>;
    fn day_total(&self, day: NaiveDate) -> AppResult<TimeDelta>;
    /// Every recorded day, most recent first.
    fn all_totals(&self) -> AppResult<Vec<(NaiveDate, TimeDelta)>>;
}

/// "Disabled for today" flags keyed by (schedule id, day).
pub trait OverrideRepository: Send + Sync {
    fn mark(&self, schedule_id: &str, day: NaiveDate) -> AppResult<()>;
    fn is_marked(&self, schedule_id: &str, day: NaiveDate) -> AppResult<bool>;
    /// Drop flags for days before `day`; returns how many were removed.
    fn purge_before(&self, day: NaiveDate) -> AppResult<usize>;
}

/// The shared block slot.
pub trait BlockStateRepository: Send + Sync {
    fn load_block_state(&self) -> AppResult<BlockState>;
    fn save_block_state(&self, state: &BlockState) -> AppResult<()>;
    fn clear_block_state(&self) -> AppResult<()>;
}

/// Which named configurations exist and what they block.
pub trait ConfigurationRegistry: Send + Sync {
    fn exists(&self, config_name: &str) -> AppResult<bool>;
    /// `None` when the configuration is missing or its selection cannot be decoded.
    fn app_selection(&self, config_name: &str) -> AppResult<Option<AppSelection>>;
    fn app_count(&self, config_name: &str) -> AppResult<usize> {
        Ok(self
            .app_selection(config_name)?
            .map_or(0, |selection| selection.total_item_count()))
    }
    fn save_mode(&self, config_name: &str, selection: &AppSelection) -> AppResult<()>;
    /// Returns false when no such configuration existed.
    fn delete_mode(&self, config_name: &str) -> AppResult<bool>;
}

/// One handle per repository seam, usually all backed by the same store.
#[derive(Clone)]
pub struct Repositories {
    pub schedules: Arc<dyn ScheduleRepository>,
    pub daily_totals: Arc<dyn DailyTotalsRepository>,
    pub overrides: Arc<dyn OverrideRepository>,
    pub block_state: Arc<dyn BlockStateRepository>,
    pub registry: Arc<dyn ConfigurationRegistry>,
}

impl Repositories {
    pub fn from_store<S>(store: &Arc<S>) -> Self
    where
        S: ScheduleRepository
            + DailyTotalsRepository
            + OverrideRepository
            + BlockStateRepository
            + ConfigurationRegistry
            + 'static,
    {
        Self {
            schedules: Arc::<S>::clone(store),
            daily_totals: Arc::<S>::clone(store),
            overrides: Arc::<S>::clone(store),
            block_state: Arc::<S>::clone(store),
            registry: Arc::<S>::clone(store),
        }
    }
}
