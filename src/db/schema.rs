pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS modes (
    name TEXT PRIMARY KEY,
    selection TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    last_used_at INTEGER
);

CREATE TABLE IF NOT EXISTS daily_time (
    day TEXT PRIMARY KEY,
    millis INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS schedule_overrides (
    schedule_id TEXT NOT NULL,
    day TEXT NOT NULL,
    PRIMARY KEY (schedule_id, day)
);

CREATE INDEX IF NOT EXISTS idx_schedule_overrides_day ON schedule_overrides(day);
"#;

/// Keys of the block slot scalars in the `kv` table.
pub const BLOCKED_START_KEY: &str = "blocked_start_date";
pub const BLOCKED_BY_SCHEDULE_KEY: &str = "blocked_by_schedule";
pub const ACTIVE_SCHEDULE_ID_KEY: &str = "active_schedule_id";
pub const ACTIVE_MODE_NAME_KEY: &str = "active_mode_name";
pub const ACTIVE_MODE_APP_COUNT_KEY: &str = "active_mode_app_count";

pub const BLOCK_STATE_KEYS: &[&str] = &[
    BLOCKED_START_KEY,
    BLOCKED_BY_SCHEDULE_KEY,
    ACTIVE_SCHEDULE_ID_KEY,
    ACTIVE_MODE_NAME_KEY,
    ACTIVE_MODE_APP_COUNT_KEY,
];
