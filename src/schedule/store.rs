use crate::error::AppResult;
use crate::models::ScheduleEntry;
use crate::store::{ConfigurationRegistry, ScheduleRepository};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of an active-schedule read: usable entries plus orphans found on the way.
#[derive(Debug, Default)]
pub struct ActiveSchedules {
    pub entries: Vec<ScheduleEntry>,
    /// Ids of entries whose configuration no longer exists.
    pub orphans: Vec<String>,
}

/// CRUD over the whole schedule collection, persisted as one unit.
///
/// The store only persists; re-evaluation after a change is the engine's job.
pub struct ScheduleStore {
    repo: Arc<dyn ScheduleRepository>,
    registry: Arc<dyn ConfigurationRegistry>,
}

impl ScheduleStore {
    pub fn new(repo: Arc<dyn ScheduleRepository>, registry: Arc<dyn ConfigurationRegistry>) -> Self {
        Self { repo, registry }
    }

    /// Every entry, active or not, in storage order.
    pub fn load_all(&self) -> AppResult<Vec<ScheduleEntry>> {
        self.repo.load_all()
    }

    pub fn find(&self, id: &str) -> AppResult<Option<ScheduleEntry>> {
        Ok(self.repo.load_all()?.into_iter().find(|s| s.id == id))
    }

    /// Insert or replace by id. The entry moves to the end of storage order.
    /// Returns true when an existing entry was replaced.
    pub fn save(&self, entry: &ScheduleEntry) -> AppResult<bool> {
        let mut schedules = self.repo.load_all()?;
        let before = schedules.len();
        schedules.retain(|s| s.id != entry.id);
        let is_update = schedules.len() != before;
        schedules.push(entry.clone());
        self.repo.save_all(&schedules)?;

        info!(
            "Schedule {} for '{}' {} ({} on days {:?}, {} total)",
            entry.id,
            entry.config_name,
            if is_update { "updated" } else { "saved" },
            entry.window_label(),
            entry.weekdays,
            schedules.len()
        );
        Ok(is_update)
    }

    /// Returns false when no entry had that id.
    pub fn remove(&self, id: &str) -> AppResult<bool> {
        let mut schedules = self.repo.load_all()?;
        let before = schedules.len();
        schedules.retain(|s| s.id != id);
        if schedules.len() == before {
            return Ok(false);
        }
        self.repo.save_all(&schedules)?;
        Ok(true)
    }

    /// Remove every entry bound to `config_name`, returning what was removed.
    pub fn remove_all_for_config(&self, config_name: &str) -> AppResult<Vec<ScheduleEntry>> {
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .repo
            .load_all()?
            .into_iter()
            .partition(|s| s.config_name == config_name);

        if !removed.is_empty() {
            self.repo.save_all(&kept)?;
            info!(
                "Removed {} schedule(s) of '{config_name}', {} remaining",
                removed.len(),
                kept.len()
            );
        }
        Ok(removed)
    }

    /// Remove the given ids in one write. Returns how many were removed.
    pub fn remove_many(&self, ids: &[String]) -> AppResult<usize> {
        let mut schedules = self.repo.load_all()?;
        let before = schedules.len();
        schedules.retain(|s| !ids.contains(&s.id));
        let removed = before - schedules.len();
        if removed > 0 {
            self.repo.save_all(&schedules)?;
        }
        Ok(removed)
    }

    /// Active entries whose configuration still exists, in storage order.
    ///
    /// Entries of deleted configurations are left out and reported as orphans
    /// so the caller can queue their deletion.
    pub fn load_active(&self) -> AppResult<ActiveSchedules> {
        let mut exists: HashMap<String, bool> = HashMap::new();
        let mut result = ActiveSchedules::default();

        for entry in self.repo.load_all()? {
            let config_exists = match exists.get(&entry.config_name) {
                Some(known) => *known,
                None => {
                    let found = self.registry.exists(&entry.config_name)?;
                    exists.insert(entry.config_name.clone(), found);
                    found
                }
            };

            if !config_exists {
                debug!(
                    "Schedule {} belongs to deleted mode '{}', skipping",
                    entry.id, entry.config_name
                );
                result.orphans.push(entry.id);
            } else if entry.is_active {
                result.entries.push(entry);
            }
        }

        Ok(result)
    }
}
