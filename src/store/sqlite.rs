use super::{
    BlockStateRepository, ConfigurationRegistry, DailyTotalsRepository, OverrideRepository,
    ScheduleRepository,
};
use crate::constants::SCHEDULES_KEY;
use crate::db::schema::{
    ACTIVE_MODE_APP_COUNT_KEY, ACTIVE_MODE_NAME_KEY, ACTIVE_SCHEDULE_ID_KEY, BLOCKED_BY_SCHEDULE_KEY,
    BLOCKED_START_KEY, BLOCK_STATE_KEYS,
};
use crate::db::{kv_get, kv_remove, kv_set, with_connection, Database};
use crate::error::AppResult;
use crate::models::{AppSelection, BlockState, ScheduleEntry};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Utc};
use log::warn;
use rusqlite::{params, OptionalExtension};
use std::sync::{Arc, Mutex};

const DAY_FORMAT: &str = "%Y-%m-%d";
const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// All engine persistence backed by one SQLite database.
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteStore {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }
}

fn day_key(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

impl ScheduleRepository for SqliteStore {
    fn load_all(&self) -> AppResult<Vec<ScheduleEntry>> {
        let raw = with_connection(&self.db, "load schedules", |conn| kv_get(conn, SCHEDULES_KEY))?;
        let Some(raw) = raw else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<ScheduleEntry>>(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!("Stored schedules could not be decoded, treating as empty: {e}");
                Ok(Vec::new())
            }
        }
    }

    fn save_all(&self, entries: &[ScheduleEntry]) -> AppResult<()> {
        let encoded = serde_json::to_string(entries)?;
        with_connection(&self.db, "save schedules", |conn| kv_set(conn, SCHEDULES_KEY, &encoded))
    }
}

impl DailyTotalsRepository for SqliteStore {
    fn add_to_day(&self, day: NaiveDate, amount: TimeDelta) -> AppResult<()> {
        let key = day_key(day);
        with_connection(&self.db, "add daily time", |conn| {
            conn.execute(
                "INSERT INTO daily_time (day, millis) VALUES (?1, ?2)
                 ON CONFLICT(day) DO UPDATE SET millis = millis + excluded.millis",
                params![key, amount.num_milliseconds()],
            )?;
            Ok(())
        })
    }

    fn day_total(&self, day: NaiveDate) -> AppResult<TimeDelta> {
        let key = day_key(day);
        let millis: Option<i64> = with_connection(&self.db, "load daily time", |conn| {
            Ok(conn
                .query_row("SELECT millis FROM daily_time WHERE day = ?1", params![key], |row| row.get(0))
                .optional()?)
        })?;
        Ok(TimeDelta::milliseconds(millis.unwrap_or(0)))
    }

    fn all_totals(&self) -> AppResult<Vec<(NaiveDate, TimeDelta)>> {
        let rows: Vec<(String, i64)> = with_connection(&self.db, "load daily totals", |conn| {
            let mut stmt = conn.prepare("SELECT day, millis FROM daily_time ORDER BY day DESC")?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })?;

        Ok(rows
            .into_iter()
            .filter_map(|(day, millis)| match NaiveDate::parse_from_str(&day, DAY_FORMAT) {
                Ok(date) => Some((date, TimeDelta::milliseconds(millis))),
                Err(e) => {
                    warn!("Skipping daily total with malformed day '{day}': {e}");
                    None
                }
            })
            .collect())
    }
}

impl OverrideRepository for SqliteStore {
    fn mark(&self, schedule_id: &str, day: NaiveDate) -> AppResult<()> {
        let key = day_key(day);
        with_connection(&self.db, "mark schedule override", |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO schedule_overrides (schedule_id, day) VALUES (?1, ?2)",
                params![schedule_id, key],
            )?;
            Ok(())
        })
    }

    fn is_marked(&self, schedule_id: &str, day: NaiveDate) -> AppResult<bool> {
        let key = day_key(day);
        with_connection(&self.db, "read schedule override", |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM schedule_overrides WHERE schedule_id = ?1 AND day = ?2",
                params![schedule_id, key],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    fn purge_before(&self, day: NaiveDate) -> AppResult<usize> {
        let key = day_key(day);
        with_connection(&self.db, "purge schedule overrides", |conn| {
            Ok(conn.execute("DELETE FROM schedule_overrides WHERE day < ?1", params![key])?)
        })
    }
}

impl BlockStateRepository for SqliteStore {
    fn load_block_state(&self) -> AppResult<BlockState> {
        with_connection(&self.db, "load block state", |conn| {
            let started_at = kv_get(conn, BLOCKED_START_KEY)?.and_then(|raw| {
                NaiveDateTime::parse_from_str(&raw, INSTANT_FORMAT)
                    .map_err(|e| warn!("Ignoring malformed block start '{raw}': {e}"))
                    .ok()
            });
            let by_schedule = kv_get(conn, BLOCKED_BY_SCHEDULE_KEY)?.is_some_and(|v| v == "1");
            let schedule_id = kv_get(conn, ACTIVE_SCHEDULE_ID_KEY)?;
            let config_name = kv_get(conn, ACTIVE_MODE_NAME_KEY)?;
            let app_count = kv_get(conn, ACTIVE_MODE_APP_COUNT_KEY)?
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);

            Ok(BlockState {
                started_at,
                by_schedule,
                schedule_id,
                config_name,
                app_count,
            })
        })
    }

    fn save_block_state(&self, state: &BlockState) -> AppResult<()> {
        with_connection(&self.db, "save block state", |conn| {
            // All slot keys change together or not at all
            let tx = conn.unchecked_transaction()?;
            let conn = &*tx;
            match state.started_at {
                Some(start) => kv_set(conn, BLOCKED_START_KEY, &start.format(INSTANT_FORMAT).to_string())?,
                None => {
                    kv_remove(conn, BLOCKED_START_KEY)?;
                }
            }
            if state.by_schedule {
                kv_set(conn, BLOCKED_BY_SCHEDULE_KEY, "1")?;
            } else {
                kv_remove(conn, BLOCKED_BY_SCHEDULE_KEY)?;
            }
            match &state.schedule_id {
                Some(id) => kv_set(conn, ACTIVE_SCHEDULE_ID_KEY, id)?,
                None => {
                    kv_remove(conn, ACTIVE_SCHEDULE_ID_KEY)?;
                }
            }
            match &state.config_name {
                Some(name) => kv_set(conn, ACTIVE_MODE_NAME_KEY, name)?,
                None => {
                    kv_remove(conn, ACTIVE_MODE_NAME_KEY)?;
                }
            }
            kv_set(conn, ACTIVE_MODE_APP_COUNT_KEY, &state.app_count.to_string())?;
            tx.commit()?;
            Ok(())
        })
    }

    fn clear_block_state(&self) -> AppResult<()> {
        with_connection(&self.db, "clear block state", |conn| {
            let tx = conn.unchecked_transaction()?;
            for key in BLOCK_STATE_KEYS {
                kv_remove(&tx, key)?;
            }
            tx.commit()?;
            Ok(())
        })
    }
}

impl ConfigurationRegistry for SqliteStore {
    fn exists(&self, config_name: &str) -> AppResult<bool> {
        with_connection(&self.db, "check mode", |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM modes WHERE name = ?1",
                params![config_name],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    fn app_selection(&self, config_name: &str) -> AppResult<Option<AppSelection>> {
        let raw: Option<String> = with_connection(&self.db, "load mode selection", |conn| {
            Ok(conn
                .query_row(
                    "SELECT selection FROM modes WHERE name = ?1",
                    params![config_name],
                    |row| row.get(0),
                )
                .optional()?)
        })?;

        Ok(raw.and_then(|raw| {
            serde_json::from_str(&raw)
                .map_err(|e| warn!("Selection of mode '{config_name}' could not be decoded: {e}"))
                .ok()
        }))
    }

    fn save_mode(&self, config_name: &str, selection: &AppSelection) -> AppResult<()> {
        let encoded = serde_json::to_string(selection)?;
        with_connection(&self.db, "save mode", |conn| {
            conn.execute(
                "INSERT INTO modes (name, selection, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO UPDATE SET selection = excluded.selection",
                params![config_name, encoded, Utc::now().timestamp()],
            )?;
            Ok(())
        })
    }

    fn delete_mode(&self, config_name: &str) -> AppResult<bool> {
        with_connection(&self.db, "delete mode", |conn| {
            let rows_affected = conn.execute("DELETE FROM modes WHERE name = ?1", params![config_name])?;
            Ok(rows_affected > 0)
        })
    }
}
