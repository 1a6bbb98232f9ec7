use chrono::{NaiveDateTime, TimeDelta};

/// The persisted "something is blocked" slot.
///
/// Schedule-driven and manual blocks share this one slot so that every
/// block interval is accounted exactly once, by whoever clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockState {
    /// When the current block began. `None` when nothing is blocked.
    pub started_at: Option<NaiveDateTime>,
    /// True when the block belongs to a schedule rather than the user.
    pub by_schedule: bool,
    /// Schedule that owns the block, for restart recovery.
    pub schedule_id: Option<String>,
    /// Configuration being blocked and how many items it covers.
    pub config_name: Option<String>,
    pub app_count: usize,
}

impl BlockState {
    pub fn scheduled(started_at: NaiveDateTime, schedule_id: &str, config_name: &str, app_count: usize) -> Self {
        Self {
            started_at: Some(started_at),
            by_schedule: true,
            schedule_id: Some(schedule_id.to_string()),
            config_name: Some(config_name.to_string()),
            app_count,
        }
    }

    pub fn manual(started_at: NaiveDateTime, config_name: &str, app_count: usize) -> Self {
        Self {
            started_at: Some(started_at),
            by_schedule: false,
            schedule_id: None,
            config_name: Some(config_name.to_string()),
            app_count,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.started_at.is_some()
    }

    /// A block is running that no schedule owns.
    pub fn is_manual_block(&self) -> bool {
        self.is_blocked() && !self.by_schedule
    }

    pub fn elapsed(&self, now: NaiveDateTime) -> Option<TimeDelta> {
        self.started_at.map(|start| (now - start).max(TimeDelta::zero()))
    }
}
