use crate::accounting::format_elapsed;
use crate::models::{AppSelection, ScheduleEntry};
use crate::service::{BlockStats, BlockStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub id: String,
    pub config_name: String,
    pub weekdays: Vec<u8>,
    pub start_time: String,
    pub end_time: String,
    pub is_active: bool,
    pub crosses_midnight: bool,
    pub created_at: String,
}

impl From<ScheduleEntry> for ScheduleResponse {
    fn from(schedule: ScheduleEntry) -> Self {
        Self {
            crosses_midnight: schedule.crosses_midnight(),
            start_time: schedule.start_time.format("%H:%M").to_string(),
            end_time: schedule.end_time.format("%H:%M").to_string(),
            created_at: schedule.created_at.to_rfc3339(),
            weekdays: schedule.weekdays.into_iter().collect(),
            id: schedule.id,
            config_name: schedule.config_name,
            is_active: schedule.is_active,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateScheduleRequest {
    pub config_name: String,
    pub weekdays: Vec<u8>,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScheduleRequest {
    pub id: String,
    pub config_name: String,
    pub weekdays: Vec<u8>,
    pub start_time: String,
    pub end_time: String,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct ConflictCheckRequest {
    pub weekdays: Vec<u8>,
    pub start_time: String,
    pub end_time: String,
    pub excluding_config_name: String,
    /// Id of the schedule being edited, if any
    #[serde(default)]
    pub schedule_id: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct BlockStatusResponse {
    pub blocked: bool,
    pub blocked_by_schedule: bool,
    pub schedule_id: Option<String>,
    pub config_name: Option<String>,
    pub app_count: usize,
    pub elapsed_secs: Option<i64>,
    /// "Xh Ym Zs" for the live timer
    pub elapsed_label: Option<String>,
}

impl From<BlockStatus> for BlockStatusResponse {
    fn from(status: BlockStatus) -> Self {
        Self {
            blocked: status.block.is_blocked(),
            blocked_by_schedule: status.engine.is_blocked_by_schedule,
            schedule_id: status.engine.current_schedule.map(|s| s.id),
            config_name: status.block.config_name,
            app_count: status.block.app_count,
            elapsed_secs: status.elapsed.map(|e| e.num_seconds()),
            elapsed_label: status.elapsed.map(format_elapsed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DailyTotalResponse {
    /// YYYY-MM-DD
    pub day: String,
    pub blocked_secs: i64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub today_secs: i64,
    pub average_secs: i64,
    pub days: Vec<DailyTotalResponse>,
}

impl From<BlockStats> for StatsResponse {
    fn from(stats: BlockStats) -> Self {
        Self {
            today_secs: stats.today.num_seconds(),
            average_secs: stats.average.num_seconds(),
            days: stats
                .days
                .into_iter()
                .map(|(day, total)| DailyTotalResponse {
                    day: day.format("%Y-%m-%d").to_string(),
                    blocked_secs: total.num_seconds(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveModeRequest {
    pub name: String,
    #[serde(default)]
    pub selection: AppSelection,
}

#[derive(Debug, Deserialize)]
pub struct RenameModeRequest {
    pub old_name: String,
    pub new_name: String,
}
