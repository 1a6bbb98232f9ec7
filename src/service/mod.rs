//! The single worker thread that owns the engine.
//!
//! Poll ticks and every caller request are messages on one queue, so no two
//! reconciliation passes ever run at the same time.

use crate::constants::{DEFAULT_POLL_INTERVAL_SECS, DEFAULT_REMINDER_LEAD_MINUTES};
use crate::engine::{EngineEvent, EngineState, ReconciliationEngine, Transition};
use crate::error::{AppError, AppResult};
use crate::models::{AppSelection, BlockState, ScheduleEntry};
use crate::schedule::ConflictChecker;
use chrono::{NaiveDate, NaiveTime, TimeDelta};
use log::{debug, error, info, warn};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub struct SchedulerConfig {
    pub poll_interval: Duration,
    pub reminder_lead_minutes: u32,
    pub reminders_enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            reminder_lead_minutes: DEFAULT_REMINDER_LEAD_MINUTES,
            reminders_enabled: true,
        }
    }
}

type Job = Box<dyn FnOnce(&mut ReconciliationEngine) + Send>;

enum Command {
    Run(Job),
    Shutdown,
}

/// Block slot plus engine belief, read in one step.
#[derive(Debug, Clone)]
pub struct BlockStatus {
    pub engine: EngineState,
    pub block: BlockState,
    pub elapsed: Option<TimeDelta>,
}

#[derive(Debug, Clone)]
pub struct BlockStats {
    pub today: TimeDelta,
    pub average: TimeDelta,
    /// Most recent first.
    pub days: Vec<(NaiveDate, TimeDelta)>,
}

/// Cloneable entry point into the worker. Every call waits for the worker's reply.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: Sender<Command>,
}

impl SchedulerHandle {
    /// Run `f` on the worker thread against the engine and wait for its result.
    pub fn call<T, F>(&self, f: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut ReconciliationEngine) -> AppResult<T> + Send + 'static,
    {
        let (reply_tx, reply_rx) = mpsc::channel();
        let job: Job = Box::new(move |engine: &mut ReconciliationEngine| {
            // The caller may have given up waiting
            let _ = reply_tx.send(f(engine));
        });
        self.tx
            .send(Command::Run(job))
            .map_err(|_| AppError::ServiceStopped)?;
        reply_rx.recv().map_err(|_| AppError::ServiceStopped)?
    }

    pub fn reconcile(&self) -> AppResult<Transition> {
        self.call(ReconciliationEngine::reconcile)
    }

    pub fn list_schedules(&self) -> AppResult<Vec<ScheduleEntry>> {
        self.call(|engine| engine.store().load_all())
    }

    pub fn find_schedule(&self, id: &str) -> AppResult<Option<ScheduleEntry>> {
        let id = id.to_string();
        self.call(move |engine| engine.store().find(&id))
    }

    pub fn save_schedule(&self, entry: ScheduleEntry) -> AppResult<bool> {
        self.call(move |engine| engine.save_schedule(&entry))
    }

    pub fn remove_schedule(&self, id: &str) -> AppResult<bool> {
        let id = id.to_string();
        self.call(move |engine| engine.remove_schedule(&id))
    }

    pub fn remove_all_for_config(&self, config_name: &str) -> AppResult<usize> {
        let name = config_name.to_string();
        self.call(move |engine| engine.remove_all_for_config(&name))
    }

    pub fn has_conflict(
        &self,
        weekdays: BTreeSet<u8>,
        start: NaiveTime,
        end: NaiveTime,
        excluding_config_name: &str,
        editing_id: Option<&str>,
    ) -> AppResult<bool> {
        let excluding = excluding_config_name.to_string();
        let editing = editing_id.map(str::to_string);
        self.call(move |engine| {
            ConflictChecker::new(engine.store())
                .ignoring_schedule(editing.as_deref())
                .has_conflict(&weekdays, start, end, &excluding)
        })
    }

    pub fn disable_schedule_for_today(&self, schedule_id: &str) -> AppResult<bool> {
        let id = schedule_id.to_string();
        self.call(move |engine| engine.disable_schedule_for_today(&id))
    }

    pub fn manual_unblock(&self) -> AppResult<Transition> {
        self.call(ReconciliationEngine::manual_unblock)
    }

    pub fn start_manual_block(&self, config_name: &str) -> AppResult<()> {
        let name = config_name.to_string();
        self.call(move |engine| engine.start_manual_block(&name))
    }

    pub fn end_manual_block(&self) -> AppResult<TimeDelta> {
        self.call(ReconciliationEngine::end_manual_block)
    }

    pub fn save_mode(&self, config_name: &str, selection: AppSelection) -> AppResult<()> {
        let name = config_name.to_string();
        self.call(move |engine| engine.save_mode(&name, &selection))
    }

    pub fn delete_configuration(&self, config_name: &str) -> AppResult<bool> {
        let name = config_name.to_string();
        self.call(move |engine| engine.delete_configuration(&name))
    }

    pub fn rename_configuration(&self, old_name: &str, new_name: &str) -> AppResult<usize> {
        let (old_name, new_name) = (old_name.to_string(), new_name.to_string());
        self.call(move |engine| engine.rename_configuration(&old_name, &new_name))
    }

    pub fn status(&self) -> AppResult<BlockStatus> {
        self.call(|engine| {
            Ok(BlockStatus {
                engine: engine.state().clone(),
                block: engine.block_state()?,
                elapsed: engine.elapsed_blocked()?,
            })
        })
    }

    pub fn stats(&self) -> AppResult<BlockStats> {
        self.call(|engine| {
            let accountant = engine.accountant();
            Ok(BlockStats {
                today: accountant.today_total(engine.now())?,
                average: accountant.average()?,
                days: accountant.all_day_totals()?,
            })
        })
    }

    pub fn subscribe(&self) -> AppResult<Receiver<EngineEvent>> {
        self.call(|engine| Ok(engine.subscribe()))
    }
}

pub struct SchedulerService {
    config: SchedulerConfig,
    running: Arc<AtomicBool>,
    handle: SchedulerHandle,
    inbox: Option<Receiver<Command>>,
    engine: Option<ReconciliationEngine>,
}

impl SchedulerService {
    pub fn new(engine: ReconciliationEngine, config: SchedulerConfig) -> Self {
        let engine = if config.reminders_enabled {
            engine.with_reminders(config.reminder_lead_minutes)
        } else {
            engine
        };
        let (tx, rx) = mpsc::channel();

        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            handle: SchedulerHandle { tx },
            inbox: Some(rx),
            engine: Some(engine),
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    /// Spawn the worker. The engine restores persisted state and runs a
    /// first pass before serving requests. Can only be started once.
    pub fn start(&mut self) -> AppResult<thread::JoinHandle<()>> {
        let (Some(mut engine), Some(inbox)) = (self.engine.take(), self.inbox.take()) else {
            return Err(AppError::Internal("scheduler already started".into()));
        };

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let poll_interval = self.config.poll_interval;

        Ok(thread::spawn(move || {
            info!("Scheduler started, polling every {poll_interval:?}");
            if let Err(e) = engine.restore() {
                error!("Failed to restore block state: {e}");
            }
            if let Err(e) = engine.reconcile() {
                warn!("Initial reconciliation pass failed: {e}");
            }
            engine.process_cleanup();

            let mut next_tick = Instant::now() + poll_interval;
            while running.load(Ordering::SeqCst) {
                let timeout = next_tick.saturating_duration_since(Instant::now());
                match inbox.recv_timeout(timeout) {
                    Ok(Command::Run(job)) => job(&mut engine),
                    Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {
                        match engine.reconcile() {
                            Ok(transition) => debug!("Poll tick: {transition:?}"),
                            Err(e) => warn!("Reconciliation pass failed: {e}"),
                        }
                        next_tick = Instant::now() + poll_interval;
                    }
                }
                engine.process_cleanup();
            }

            running.store(false, Ordering::SeqCst);
            info!("Scheduler stopped");
        }))
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        // Wake the worker if it is waiting
        let _ = self.handle.tx.send(Command::Shutdown);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
