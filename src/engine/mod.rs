//! The schedule reconciliation state machine.
//!
//! One engine instance owns the "which schedule is blocking right now" belief.
//! Every mutation goes through a method on [`ReconciliationEngine`], and the
//! service layer guarantees those methods run on a single thread.

pub mod events;

pub use events::{EngineEvent, EventBus};

use crate::accounting::{format_elapsed, TimeAccountant};
use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::models::{weekday_number, AppSelection, BlockState, ScheduleEntry};
use crate::overrides::TodayOverrideLedger;
use crate::platform::{BlockingProvider, Notifier};
use crate::reminders::{starting_now, ReminderPlanner};
use crate::schedule::{ConflictChecker, ScheduleStore};
use crate::store::{BlockStateRepository, ConfigurationRegistry, Repositories};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// What the engine believes it has activated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineState {
    pub current_schedule: Option<ScheduleEntry>,
    pub is_blocked_by_schedule: bool,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Activated(ScheduleEntry),
    Deactivated(ScheduleEntry),
    Switched { from: ScheduleEntry, to: ScheduleEntry },
    /// Due while a manual block was running; disabled for today instead.
    Suppressed(ScheduleEntry),
    /// Due, but its configuration's selection could not be read. Retried next pass.
    ActivationSkipped(ScheduleEntry),
}

/// Deferred work discovered during a pass, run after the pass completes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CleanupTask {
    DeleteOrphans(Vec<String>),
    PurgeOverridesBefore(NaiveDate),
}

pub struct ReconciliationEngine {
    store: ScheduleStore,
    accountant: TimeAccountant,
    ledger: TodayOverrideLedger,
    slot: Arc<dyn BlockStateRepository>,
    registry: Arc<dyn ConfigurationRegistry>,
    blocker: Arc<dyn BlockingProvider>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    reminders: Option<ReminderPlanner>,
    state: EngineState,
    events: EventBus,
    cleanup: VecDeque<CleanupTask>,
    last_gc_day: Option<NaiveDate>,
}

impl ReconciliationEngine {
    pub fn new(
        repos: &Repositories,
        blocker: Arc<dyn BlockingProvider>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store: ScheduleStore::new(Arc::clone(&repos.schedules), Arc::clone(&repos.registry)),
            accountant: TimeAccountant::new(Arc::clone(&repos.daily_totals)),
            ledger: TodayOverrideLedger::new(Arc::clone(&repos.overrides)),
            slot: Arc::clone(&repos.block_state),
            registry: Arc::clone(&repos.registry),
            blocker,
            notifier,
            clock,
            reminders: None,
            state: EngineState::default(),
            events: EventBus::default(),
            cleanup: VecDeque::new(),
            last_gc_day: None,
        }
    }

    /// Enable "starts soon" notifications `lead_minutes` ahead of each schedule.
    #[must_use]
    pub fn with_reminders(mut self, lead_minutes: u32) -> Self {
        self.reminders = Some(ReminderPlanner::new(lead_minutes));
        self
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn store(&self) -> &ScheduleStore {
        &self.store
    }

    pub fn accountant(&self) -> &TimeAccountant {
        &self.accountant
    }

    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Re-attach to a schedule-driven block persisted by a previous run.
    ///
    /// If the owning schedule is gone the block is ended right away so the
    /// interval is still accounted.
    pub fn restore(&mut self) -> AppResult<()> {
        let slot = self.slot.load_block_state()?;
        if !slot.by_schedule || !slot.is_blocked() {
            return Ok(());
        }

        let owner = match &slot.schedule_id {
            Some(id) => self.store.find(id)?,
            None => None,
        };

        match owner {
            Some(schedule) => {
                info!(
                    "Restored schedule-driven block of '{}' started at {:?}",
                    schedule.config_name, slot.started_at
                );
                self.state = EngineState {
                    current_schedule: Some(schedule),
                    is_blocked_by_schedule: true,
                };
            }
            None => {
                warn!("Persisted schedule block has no owning schedule, ending it");
                self.unblock_quietly();
                let elapsed = self.finish_block(self.clock.now())?;
                self.events.publish(&EngineEvent::ManualBlockEnded {
                    config_name: slot.config_name,
                    elapsed_secs: elapsed.num_seconds(),
                });
            }
        }
        Ok(())
    }

    /// One decide-and-act pass.
    pub fn reconcile(&mut self) -> AppResult<Transition> {
        let now = self.clock.now();
        let today = now.date();
        self.queue_override_gc(today);

        let active = self.store.load_active()?;
        if !active.orphans.is_empty() {
            self.cleanup.push_back(CleanupTask::DeleteOrphans(active.orphans));
        }

        let mut candidates = Vec::with_capacity(active.entries.len());
        for entry in active.entries {
            if !entry.is_valid() {
                continue;
            }
            if self.ledger.is_disabled(&entry.id, today)? {
                debug!("Schedule {} ('{}') is disabled for today", entry.id, entry.config_name);
                continue;
            }
            candidates.push(entry);
        }

        self.send_reminders(&candidates, now);

        let due = candidates.into_iter().find(|entry| entry.should_be_active_at(now));
        debug!(
            "Pass at {now}: due={:?}, current={:?}",
            due.as_ref().map(|s| &s.config_name),
            self.state.current_schedule.as_ref().map(|s| &s.config_name)
        );

        match (self.state.current_schedule.clone(), due) {
            (None, None) => Ok(Transition::Unchanged),
            (None, Some(schedule)) => {
                if self.slot.load_block_state()?.is_manual_block() {
                    self.suppress(&schedule, today)?;
                    return Ok(Transition::Suppressed(schedule));
                }
                if self.activate(&schedule, now)? {
                    Ok(Transition::Activated(schedule))
                } else {
                    Ok(Transition::ActivationSkipped(schedule))
                }
            }
            (Some(current), Some(schedule))
                if current.id == schedule.id && current.config_name == schedule.config_name =>
            {
                // Pick up edits to the running schedule
                self.state.current_schedule = Some(schedule);
                Ok(Transition::Unchanged)
            }
            (Some(current), Some(schedule)) => {
                info!(
                    "Switching from '{}' to '{}'",
                    current.config_name, schedule.config_name
                );
                self.deactivate(now)?;
                if self.activate(&schedule, now)? {
                    Ok(Transition::Switched { from: current, to: schedule })
                } else {
                    Ok(Transition::Deactivated(current))
                }
            }
            (Some(current), None) => {
                self.deactivate(now)?;
                Ok(Transition::Deactivated(current))
            }
        }
    }

    /// Save a schedule and re-evaluate. Active schedules that overlap an
    /// active schedule of another configuration are refused.
    ///
    /// Returns true when an existing entry with the same id was replaced.
    pub fn save_schedule(&mut self, entry: &ScheduleEntry) -> AppResult<bool> {
        if entry.is_active {
            let checker = ConflictChecker::new(&self.store).ignoring_schedule(Some(&entry.id));
            if let Some(conflict) = checker.find_conflict(
                &entry.weekdays,
                entry.start_time,
                entry.end_time,
                &entry.config_name,
            )? {
                warn!(
                    "Refusing schedule for '{}': overlaps {} of '{}'",
                    entry.config_name,
                    conflict.window_label(),
                    conflict.config_name
                );
                return Err(AppError::ScheduleConflict {
                    config_name: conflict.config_name,
                });
            }
        }

        let is_update = self.store.save(entry)?;
        self.reconcile()?;
        Ok(is_update)
    }

    pub fn remove_schedule(&mut self, id: &str) -> AppResult<bool> {
        let removed = self.store.remove(id)?;
        if removed {
            self.reconcile()?;
        }
        Ok(removed)
    }

    /// Remove every schedule of a configuration. A block driven by one of
    /// them is ended first so the provider is never left engaged without an owner.
    pub fn remove_all_for_config(&mut self, config_name: &str) -> AppResult<usize> {
        let drives_block = self
            .state
            .current_schedule
            .as_ref()
            .is_some_and(|s| s.config_name == config_name);
        if drives_block {
            self.manual_unblock()?;
        }

        let removed = self.store.remove_all_for_config(config_name)?;
        if !removed.is_empty() {
            self.reconcile()?;
        }
        Ok(removed.len())
    }

    /// Suppress one schedule for the rest of today, ending its block if it owns one.
    ///
    /// Returns false when the schedule does not exist or does not run today.
    pub fn disable_schedule_for_today(&mut self, schedule_id: &str) -> AppResult<bool> {
        let Some(schedule) = self.store.find(schedule_id)? else {
            return Ok(false);
        };

        let now = self.clock.now();
        if !schedule.applies_to_day(weekday_number(now.date())) {
            debug!("Schedule {schedule_id} does not run today, nothing to disable");
            return Ok(false);
        }

        self.ledger.mark(schedule_id, now.date())?;

        let is_current = self
            .state
            .current_schedule
            .as_ref()
            .is_some_and(|s| s.id == schedule_id);
        if is_current {
            self.deactivate(now)?;
        }
        Ok(true)
    }

    /// End the schedule-driven block, if any, and keep that schedule off for today.
    pub fn manual_unblock(&mut self) -> AppResult<Transition> {
        let Some(current) = self.state.current_schedule.clone() else {
            debug!("Manual unblock with no schedule-driven block");
            return Ok(Transition::Unchanged);
        };

        let now = self.clock.now();
        self.ledger.mark(&current.id, now.date())?;
        self.deactivate(now)?;
        info!("Manual unblock of '{}'", current.config_name);
        Ok(Transition::Deactivated(current))
    }

    /// Block a configuration on the user's behalf, outside any schedule.
    pub fn start_manual_block(&mut self, config_name: &str) -> AppResult<()> {
        if self.state.current_schedule.is_some() || self.slot.load_block_state()?.is_blocked() {
            return Err(AppError::InvalidInput {
                field: "block",
                reason: "a block is already active".into(),
            });
        }

        let selection = self.selection_for(config_name)?;
        if let Err(e) = self.blocker.block(&selection) {
            warn!("Blocking provider failed for '{config_name}', continuing: {e}");
        }

        let now = self.clock.now();
        let app_count = selection.total_item_count();
        self.slot
            .save_block_state(&BlockState::manual(now, config_name, app_count))?;

        info!("Manual block of '{config_name}' started ({app_count} items)");
        self.events.publish(&EngineEvent::ManualBlockStarted {
            config_name: config_name.to_string(),
            started_at: now,
            app_count,
        });
        Ok(())
    }

    /// End whatever block is running. A schedule-driven block is treated as a
    /// manual unblock. Returns the elapsed time of the ended block.
    pub fn end_manual_block(&mut self) -> AppResult<TimeDelta> {
        let now = self.clock.now();
        let slot = self.slot.load_block_state()?;
        let elapsed = slot.elapsed(now).unwrap_or_else(TimeDelta::zero);

        if self.state.current_schedule.is_some() {
            self.manual_unblock()?;
            return Ok(elapsed);
        }
        if !slot.is_blocked() {
            return Ok(TimeDelta::zero());
        }

        self.unblock_quietly();
        let elapsed = self.finish_block(now)?;
        info!("Manual block ended after {}", format_elapsed(elapsed));
        self.events.publish(&EngineEvent::ManualBlockEnded {
            config_name: slot.config_name,
            elapsed_secs: elapsed.num_seconds(),
        });
        Ok(elapsed)
    }

    /// Create or update a configuration's selection, then re-evaluate.
    pub fn save_mode(&mut self, config_name: &str, selection: &AppSelection) -> AppResult<()> {
        self.registry.save_mode(config_name, selection)?;
        info!(
            "Saved mode '{config_name}' with {} items",
            selection.total_item_count()
        );
        self.reconcile()?;
        Ok(())
    }

    /// Delete a configuration together with its schedules.
    pub fn delete_configuration(&mut self, config_name: &str) -> AppResult<bool> {
        self.remove_all_for_config(config_name)?;
        let deleted = self.registry.delete_mode(config_name)?;
        if deleted {
            info!("Deleted mode '{config_name}'");
        }
        Ok(deleted)
    }

    /// Rename a configuration. Its schedules are recreated under the new
    /// name with fresh ids. Returns how many schedules moved.
    pub fn rename_configuration(&mut self, old_name: &str, new_name: &str) -> AppResult<usize> {
        if old_name == new_name {
            return Ok(0);
        }
        if self.registry.exists(new_name)? {
            return Err(AppError::InvalidInput {
                field: "name",
                reason: format!("a mode named '{new_name}' already exists"),
            });
        }
        let selection = self.selection_for(old_name)?;

        let moved: Vec<ScheduleEntry> = self
            .store
            .load_all()?
            .into_iter()
            .filter(|s| s.config_name == old_name)
            .collect();

        self.remove_all_for_config(old_name)?;
        self.registry.save_mode(new_name, &selection)?;
        self.registry.delete_mode(old_name)?;

        for old in &moved {
            let mut entry =
                ScheduleEntry::new(new_name, old.weekdays.clone(), old.start_time, old.end_time);
            entry.is_active = old.is_active;
            self.store.save(&entry)?;
        }

        info!(
            "Renamed mode '{old_name}' to '{new_name}', {} schedule(s) moved",
            moved.len()
        );
        self.reconcile()?;
        Ok(moved.len())
    }

    /// How long the current block (manual or scheduled) has been running.
    pub fn elapsed_blocked(&self) -> AppResult<Option<TimeDelta>> {
        Ok(self.slot.load_block_state()?.elapsed(self.clock.now()))
    }

    pub fn block_state(&self) -> AppResult<BlockState> {
        self.slot.load_block_state()
    }

    pub fn has_pending_cleanup(&self) -> bool {
        !self.cleanup.is_empty()
    }

    /// Run queued cleanup. Failures are logged and the task dropped; it is
    /// queued again by the next pass that finds the same condition.
    pub fn process_cleanup(&mut self) {
        while let Some(task) = self.cleanup.pop_front() {
            let result = match &task {
                CleanupTask::DeleteOrphans(ids) => self.store.remove_many(ids).map(|removed| {
                    if removed > 0 {
                        info!("Deleted {removed} orphaned schedule(s)");
                    }
                }),
                CleanupTask::PurgeOverridesBefore(day) => {
                    self.ledger.purge_before(*day).map(|_| ())
                }
            };
            if let Err(e) = result {
                warn!("Cleanup task {task:?} failed: {e}");
            }
        }
    }

    fn activate(&mut self, schedule: &ScheduleEntry, now: NaiveDateTime) -> AppResult<bool> {
        let Some(selection) = self.registry.app_selection(&schedule.config_name)? else {
            warn!(
                "Mode '{}' has no readable selection, not activating schedule {}",
                schedule.config_name, schedule.id
            );
            return Ok(false);
        };

        if let Err(e) = self.blocker.block(&selection) {
            warn!(
                "Blocking provider failed for '{}', continuing: {e}",
                schedule.config_name
            );
        }

        let app_count = selection.total_item_count();
        self.slot.save_block_state(&BlockState::scheduled(
            now,
            &schedule.id,
            &schedule.config_name,
            app_count,
        ))?;
        self.state = EngineState {
            current_schedule: Some(schedule.clone()),
            is_blocked_by_schedule: true,
        };

        info!(
            "Activated schedule {} of '{}' ({}, {app_count} items)",
            schedule.id,
            schedule.config_name,
            schedule.window_label()
        );
        if self.reminders.is_some() {
            let notice = starting_now(schedule, now);
            self.notifier.send_info(&notice.title, &notice.body);
        }
        self.events.publish(&EngineEvent::ScheduleActivated {
            schedule_id: schedule.id.clone(),
            config_name: schedule.config_name.clone(),
            started_at: now,
            app_count,
        });
        Ok(true)
    }

    fn deactivate(&mut self, now: NaiveDateTime) -> AppResult<()> {
        let Some(schedule) = self.state.current_schedule.take() else {
            return Ok(());
        };
        self.state.is_blocked_by_schedule = false;

        self.unblock_quietly();
        let elapsed = self.finish_block(now)?;

        info!(
            "Deactivated schedule {} of '{}' after {}",
            schedule.id,
            schedule.config_name,
            format_elapsed(elapsed)
        );
        self.events.publish(&EngineEvent::ScheduleDeactivated {
            schedule_id: schedule.id,
            config_name: schedule.config_name,
            elapsed_secs: elapsed.num_seconds(),
        });
        Ok(())
    }

    fn suppress(&mut self, schedule: &ScheduleEntry, today: NaiveDate) -> AppResult<()> {
        self.ledger.mark(&schedule.id, today)?;
        info!(
            "Manual block running, schedule {} of '{}' disabled for today",
            schedule.id, schedule.config_name
        );
        self.notifier.send_info(
            "Schedule skipped",
            &format!(
                "You are already focused. The '{}' schedule was disabled for today.",
                schedule.config_name
            ),
        );
        self.events.publish(&EngineEvent::ScheduleSuppressed {
            schedule_id: schedule.id.clone(),
            config_name: schedule.config_name.clone(),
        });
        Ok(())
    }

    /// Account the slot's interval exactly once, then clear the slot.
    fn finish_block(&self, now: NaiveDateTime) -> AppResult<TimeDelta> {
        let slot = self.slot.load_block_state()?;
        let elapsed = slot.elapsed(now).unwrap_or_else(TimeDelta::zero);
        if let Some(start) = slot.started_at {
            self.accountant.record_interval(start, now)?;
        }
        self.slot.clear_block_state()?;
        Ok(elapsed)
    }

    fn unblock_quietly(&self) {
        if let Err(e) = self.blocker.unblock() {
            warn!("Blocking provider failed to unblock, continuing: {e}");
        }
    }

    fn selection_for(&self, config_name: &str) -> AppResult<AppSelection> {
        if let Some(selection) = self.registry.app_selection(config_name)? {
            return Ok(selection);
        }
        if self.registry.exists(config_name)? {
            return Err(AppError::InvalidInput {
                field: "mode",
                reason: format!("selection of '{config_name}' cannot be read"),
            });
        }
        Err(AppError::NotFound { entity: "Mode" })
    }

    fn queue_override_gc(&mut self, today: NaiveDate) {
        if self.last_gc_day != Some(today) {
            self.last_gc_day = Some(today);
            self.cleanup.push_back(CleanupTask::PurgeOverridesBefore(today));
        }
    }

    fn send_reminders(&mut self, candidates: &[ScheduleEntry], now: NaiveDateTime) {
        let Some(planner) = self.reminders.as_mut() else {
            return;
        };
        for reminder in planner.due(candidates, now) {
            self.notifier.send_info(&reminder.title, &reminder.body);
        }
    }
}
