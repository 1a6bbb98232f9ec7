//! Shared test utilities.
//!
//! Database setup, date shorthands, and recording fakes of the platform seams.

#![cfg(test)]

use crate::db::{migrations, Database};
use crate::error::{AppError, AppResult};
use crate::models::AppSelection;
use crate::platform::{BlockingProvider, Notifier};
use crate::store::SqliteStore;
use chrono::{NaiveDate, NaiveTime};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};

/// Create a temporary test database with migrations applied.
///
/// The TempDir must be kept alive for the duration of the test so the
/// database file is not deleted.
pub fn setup_test_db() -> (Database, TempDir) {
    let dir = tempdir().expect("Failed to create temp directory for test DB");
    let db_path = dir.path().join("test.db");
    let db = Database::open(&db_path).expect("Failed to open test database");
    migrations::run(db.connection()).expect("Failed to run migrations on test DB");
    (db, dir)
}

pub fn setup_test_store() -> (SqliteStore, TempDir) {
    let (db, dir) = setup_test_db();
    (SqliteStore::new(Arc::new(Mutex::new(db))), dir)
}

pub fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time of day")
}

pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockCall {
    Block(AppSelection),
    Unblock,
}

/// Records every provider call. Can be switched to fail while still recording.
#[derive(Default)]
pub struct RecordingBlocker {
    calls: Mutex<Vec<BlockCall>>,
    failing: AtomicBool,
}

impl RecordingBlocker {
    pub fn calls(&self) -> Vec<BlockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn unblock_count(&self) -> usize {
        self.calls().iter().filter(|c| **c == BlockCall::Unblock).count()
    }

    pub fn block_count(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, BlockCall::Block(_))).count()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn record(&self, call: BlockCall) -> AppResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal("permission revoked".into()));
        }
        Ok(())
    }
}

impl BlockingProvider for RecordingBlocker {
    fn block(&self, selection: &AppSelection) -> AppResult<()> {
        self.record(BlockCall::Block(selection.clone()))
    }

    fn unblock(&self) -> AppResult<()> {
        self.record(BlockCall::Unblock)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send_info(&self, title: &str, body: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
    }
}
