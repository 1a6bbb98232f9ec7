use crate::constants::{FIRST_WEEKDAY, LAST_WEEKDAY, MAX_CONFIG_NAME_LEN};
use crate::error::AppError;
use chrono::NaiveTime;
use std::collections::BTreeSet;

/// Validate a time of day in HH:MM format (24-hour) and parse it.
pub fn validate_time_format(time: &str) -> Result<NaiveTime, AppError> {
    let err = |reason: &str| AppError::InvalidInput {
        field: "time",
        reason: reason.into(),
    };

    if time.len() != 5 || time.as_bytes().get(2) != Some(&b':') {
        return Err(err("must be in HH:MM format"));
    }

    let (hours, minutes) = time.split_once(':').ok_or_else(|| err("must be in HH:MM format"))?;
    let hours: u32 = hours.parse().map_err(|_| err("invalid hours"))?;
    let minutes: u32 = minutes.parse().map_err(|_| err("invalid minutes"))?;

    if hours >= 24 {
        return Err(err("hours must be 00-23"));
    }
    if minutes >= 60 {
        return Err(err("minutes must be 00-59"));
    }

    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(|| err("not a valid time of day"))
}

/// Validate weekday numbers (1 = Sunday ... 7 = Saturday) and collapse duplicates.
pub fn validate_weekdays(days: &[u8]) -> Result<BTreeSet<u8>, AppError> {
    if days.is_empty() {
        return Err(AppError::InvalidInput {
            field: "weekdays",
            reason: "at least one day required".into(),
        });
    }

    if let Some(day) = days.iter().find(|d| !(FIRST_WEEKDAY..=LAST_WEEKDAY).contains(*d)) {
        return Err(AppError::InvalidInput {
            field: "weekdays",
            reason: format!("day must be {FIRST_WEEKDAY}-{LAST_WEEKDAY}, got {day}"),
        });
    }

    Ok(days.iter().copied().collect())
}

/// Validate a configuration (mode) name.
pub fn validate_config_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput {
            field: "config_name",
            reason: "cannot be empty".into(),
        });
    }
    if name.len() > MAX_CONFIG_NAME_LEN {
        return Err(AppError::InvalidInput {
            field: "config_name",
            reason: format!("cannot exceed {MAX_CONFIG_NAME_LEN} characters"),
        });
    }
    Ok(name)
}
