//! Wall-clock abstraction.
//!
//! Schedules are defined in local wall-clock time, so every component reads
//! "now" as a `NaiveDateTime` in the user's local zone. Tests and simulations
//! drive the engine with [`ManualClock`].

use chrono::{Local, NaiveDateTime, TimeDelta};
use log::warn;
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    /// Current local wall-clock instant.
    fn now(&self) -> NaiveDateTime;
}

/// Real local time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, instant: NaiveDateTime) {
        *self.lock() = instant;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.lock();
        *now = *now + by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NaiveDateTime> {
        match self.now.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("ManualClock mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.lock()
    }
}
