use crate::service::SchedulerHandle;
use crate::validation::validate_config_name;

use super::{BlockStatusResponse, StatsResponse};

pub fn get_block_status(handle: &SchedulerHandle) -> Result<BlockStatusResponse, String> {
    Ok(BlockStatusResponse::from(handle.status()?))
}

pub fn start_manual_block(handle: &SchedulerHandle, config_name: &str) -> Result<(), String> {
    let config_name = validate_config_name(config_name)?;
    Ok(handle.start_manual_block(config_name)?)
}

/// Returns the blocked seconds of the block that was ended.
pub fn end_manual_block(handle: &SchedulerHandle) -> Result<i64, String> {
    Ok(handle.end_manual_block()?.num_seconds())
}

/// "Unbrick": leave the schedule-driven block and skip that schedule for today.
pub fn manual_unblock(handle: &SchedulerHandle) -> Result<(), String> {
    handle.manual_unblock()?;
    Ok(())
}

pub fn get_block_stats(handle: &SchedulerHandle) -> Result<StatsResponse, String> {
    Ok(StatsResponse::from(handle.stats()?))
}
