//! Wiring the default on-disk store and scheduler service.

use crate::clock::SystemClock;
use crate::db::{migrations, Database};
use crate::engine::ReconciliationEngine;
use crate::platform::{LoggingBlocker, LoggingNotifier};
use crate::service::{SchedulerConfig, SchedulerService};
use crate::store::{Repositories, SqliteStore};
use directories::ProjectDirs;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use thiserror::Error;

/// Error type for startup failures
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Could not determine project directories")]
    NoProjectDirs,
    #[error("Could not create data directory: {0}")]
    DataDirCreation(#[source] std::io::Error),
    #[error("Failed to open database: {0}")]
    DatabaseOpen(#[source] rusqlite::Error),
    #[error("Failed to run database migrations: {0}")]
    Migration(#[source] rusqlite::Error),
    #[error("Failed to start scheduler: {0}")]
    Service(#[from] crate::error::AppError),
}

pub fn get_db_path() -> Result<PathBuf, InitError> {
    let proj_dirs =
        ProjectDirs::from("com", "blockwell", "Blockwell").ok_or(InitError::NoProjectDirs)?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir).map_err(InitError::DataDirCreation)?;
    Ok(data_dir.join("blockwell.db"))
}

/// Open (or create) the database at `path` and bring its schema up to date.
pub fn open_store_at(path: &Path) -> Result<Arc<SqliteStore>, InitError> {
    let db = Database::open(path).map_err(InitError::DatabaseOpen)?;
    migrations::run(db.connection()).map_err(InitError::Migration)?;
    info!("Opened store at {}", path.display());
    Ok(Arc::new(SqliteStore::new(Arc::new(Mutex::new(db)))))
}

pub fn open_default_store() -> Result<Arc<SqliteStore>, InitError> {
    open_store_at(&get_db_path()?)
}

/// Start a scheduler over `store` with log-only platform seams.
pub fn start_service(
    store: &Arc<SqliteStore>,
    config: SchedulerConfig,
) -> Result<(SchedulerService, JoinHandle<()>), InitError> {
    let engine = ReconciliationEngine::new(
        &Repositories::from_store(store),
        Arc::new(LoggingBlocker),
        Arc::new(LoggingNotifier),
        Arc::new(SystemClock),
    );
    let mut service = SchedulerService::new(engine, config);
    let worker = service.start()?;
    Ok((service, worker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScheduleEntry;
    use crate::store::ScheduleRepository;
    use crate::test_utils::hm;
    use tempfile::tempdir;

    #[test]
    fn test_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blockwell.db");

        let entry = ScheduleEntry::new("Work", [2].into(), hm(9, 0), hm(10, 0));
        {
            let store = open_store_at(&path).unwrap();
            store.save_all(&[entry.clone()]).unwrap();
        }

        let store = open_store_at(&path).unwrap();
        assert_eq!(store.load_all().unwrap(), vec![entry]);
    }

    #[test]
    fn test_open_fails_for_directory_path() {
        let dir = tempdir().unwrap();
        let Err(err) = open_store_at(dir.path()) else {
            panic!("opening a directory as a database should fail");
        };
        assert!(matches!(err, InitError::DatabaseOpen(_) | InitError::Migration(_)));
    }

    #[test]
    fn test_start_service_over_store() {
        let dir = tempdir().unwrap();
        let store = open_store_at(&dir.path().join("blockwell.db")).unwrap();

        let (service, worker) = start_service(&store, SchedulerConfig::default()).unwrap();
        assert!(service.is_running());
        assert!(service.handle().list_schedules().unwrap().is_empty());

        service.stop();
        worker.join().unwrap();
    }
}
