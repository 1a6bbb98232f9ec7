use crate::error::AppError;
use crate::models::ScheduleEntry;
use crate::service::SchedulerHandle;
use crate::validation::{validate_config_name, validate_time_format, validate_weekdays};
use chrono::NaiveTime;
use std::collections::BTreeSet;

use super::{ConflictCheckRequest, CreateScheduleRequest, ScheduleResponse, UpdateScheduleRequest};

pub fn get_schedules(handle: &SchedulerHandle) -> Result<Vec<ScheduleResponse>, String> {
    let schedules = handle.list_schedules()?;
    Ok(schedules.into_iter().map(ScheduleResponse::from).collect())
}

pub fn create_schedule(
    handle: &SchedulerHandle,
    request: &CreateScheduleRequest,
) -> Result<ScheduleResponse, String> {
    let (weekdays, start, end) =
        validate_schedule_request(&request.weekdays, &request.start_time, &request.end_time)?;
    let config_name = validate_config_name(&request.config_name)?;

    let mut schedule = ScheduleEntry::new(config_name, weekdays, start, end);
    schedule.is_active = request.is_active;
    ensure_valid(&schedule)?;

    handle.save_schedule(schedule.clone())?;
    Ok(ScheduleResponse::from(schedule))
}

pub fn update_schedule(
    handle: &SchedulerHandle,
    request: &UpdateScheduleRequest,
) -> Result<ScheduleResponse, String> {
    let (weekdays, start, end) =
        validate_schedule_request(&request.weekdays, &request.start_time, &request.end_time)?;
    let config_name = validate_config_name(&request.config_name)?;

    let Some(mut schedule) = handle.find_schedule(&request.id)? else {
        return Err(AppError::NotFound { entity: "Schedule" }.to_string());
    };
    schedule.config_name = config_name.to_string();
    schedule.weekdays = weekdays;
    schedule.start_time = start;
    schedule.end_time = end;
    schedule.is_active = request.is_active;
    ensure_valid(&schedule)?;

    handle.save_schedule(schedule.clone())?;
    Ok(ScheduleResponse::from(schedule))
}

pub fn delete_schedule(handle: &SchedulerHandle, id: &str) -> Result<bool, String> {
    Ok(handle.remove_schedule(id)?)
}

pub fn check_schedule_conflict(
    handle: &SchedulerHandle,
    request: &ConflictCheckRequest,
) -> Result<bool, String> {
    let (weekdays, start, end) =
        validate_schedule_request(&request.weekdays, &request.start_time, &request.end_time)?;
    Ok(handle.has_conflict(
        weekdays,
        start,
        end,
        &request.excluding_config_name,
        request.schedule_id.as_deref(),
    )?)
}

pub fn disable_schedule_for_today(handle: &SchedulerHandle, id: &str) -> Result<bool, String> {
    Ok(handle.disable_schedule_for_today(id)?)
}

fn validate_schedule_request(
    weekdays: &[u8],
    start_time: &str,
    end_time: &str,
) -> Result<(BTreeSet<u8>, NaiveTime, NaiveTime), String> {
    let weekdays = validate_weekdays(weekdays)?;
    let start = validate_time_format(start_time)?;
    let end = validate_time_format(end_time)?;
    Ok((weekdays, start, end))
}

fn ensure_valid(schedule: &ScheduleEntry) -> Result<(), String> {
    if schedule.is_valid() {
        return Ok(());
    }
    Err(AppError::InvalidInput {
        field: "schedule",
        reason: "window must be at least 5 minutes".into(),
    }
    .to_string())
}
