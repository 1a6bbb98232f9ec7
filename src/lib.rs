//! Schedule-driven app blocking.
//!
//! A [`ReconciliationEngine`] decides on every pass whether the stored
//! schedules require a block right now, drives the platform's blocking
//! provider accordingly and accounts blocked time per calendar day. The
//! [`SchedulerService`] owns the engine on a single worker thread; UI code
//! talks to it through [`SchedulerHandle`] or the [`commands`] layer.

pub mod accounting;
pub mod bootstrap;
pub mod clock;
pub mod commands;
pub mod constants;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod overrides;
pub mod platform;
pub mod reminders;
pub mod schedule;
pub mod service;
pub mod store;
#[cfg(test)]
mod test_utils;
pub mod validation;

pub use accounting::{format_elapsed, TimeAccountant};
pub use bootstrap::{open_default_store, open_store_at, start_service, InitError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{EngineEvent, EngineState, ReconciliationEngine, Transition};
pub use error::{AppError, AppResult};
pub use models::{AppSelection, BlockState, ScheduleEntry};
pub use overrides::TodayOverrideLedger;
pub use platform::{BlockingProvider, Notifier};
pub use schedule::{ConflictChecker, ScheduleStore};
pub use service::{SchedulerConfig, SchedulerHandle, SchedulerService};
pub use store::{MemoryStore, Repositories, SqliteStore};
