// src/db/helpers.rs

use crate::db::Database;
use crate::error::{AppError, AppResult};
use log::{error, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Mutex;

/// Run a database operation under the lock, logging failures with the operation name.
///
/// A poisoned lock is recovered: the connection itself is still usable.
///
/// # Example
/// ```ignore
/// with_connection(&self.db, "load schedules", |conn| kv_get(conn, SCHEDULES_KEY))
/// ```
pub fn with_connection<F, T>(db: &Mutex<Database>, operation: &str, f: F) -> AppResult<T>
where
    F: FnOnce(&Connection) -> AppResult<T>,
{
    let db = match db.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("Database mutex was poisoned during {operation}, recovering");
            poisoned.into_inner()
        }
    };

    f(db.connection()).map_err(|e| {
        error!("Failed to {operation}: {e}");
        e
    })
}

pub fn kv_get(conn: &Connection, key: &str) -> AppResult<Option<String>> {
    conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
        .optional()
        .map_err(AppError::from)
}

pub fn kv_set(conn: &Connection, key: &str, value: &str) -> AppResult<()> {
    conn.execute(
        "INSERT INTO kv (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn kv_remove(conn: &Connection, key: &str) -> AppResult<bool> {
    let rows_affected = conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
    Ok(rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[test]
    fn test_kv_roundtrip_and_overwrite() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        assert!(kv_get(conn, "k").unwrap().is_none());
        kv_set(conn, "k", "one").unwrap();
        kv_set(conn, "k", "two").unwrap();
        assert_eq!(kv_get(conn, "k").unwrap().as_deref(), Some("two"));

        assert!(kv_remove(conn, "k").unwrap());
        assert!(!kv_remove(conn, "k").unwrap());
        assert!(kv_get(conn, "k").unwrap().is_none());
    }

    #[test]
    fn test_with_connection_passes_errors_through() {
        let (db, _dir) = setup_test_db();
        let db = Mutex::new(db);

        let result: AppResult<()> = with_connection(&db, "fail on purpose", |_| {
            Err(AppError::Internal("boom".into()))
        });
        assert!(matches!(result, Err(AppError::Internal(_))));

        let value = with_connection(&db, "read", |conn| kv_get(conn, "missing")).unwrap();
        assert!(value.is_none());
    }
}
