use crate::service::SchedulerHandle;
use crate::validation::validate_config_name;

use super::{RenameModeRequest, SaveModeRequest};

pub fn save_mode(handle: &SchedulerHandle, request: SaveModeRequest) -> Result<(), String> {
    let name = validate_config_name(&request.name)?;
    Ok(handle.save_mode(name, request.selection)?)
}

/// Deletes the mode and every schedule bound to it.
pub fn delete_mode(handle: &SchedulerHandle, name: &str) -> Result<bool, String> {
    Ok(handle.delete_configuration(name)?)
}

/// Returns how many schedules moved to the new name.
pub fn rename_mode(handle: &SchedulerHandle, request: &RenameModeRequest) -> Result<usize, String> {
    let new_name = validate_config_name(&request.new_name)?;
    Ok(handle.rename_configuration(&request.old_name, new_name)?)
}
