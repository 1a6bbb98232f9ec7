// src/constants.rs

/// Seconds in one day (24 * 60 * 60)
pub const SECS_PER_DAY: i64 = 86400;

/// Minutes in one day; minute-of-day values live in `0..MINUTES_PER_DAY`
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Shortest window a schedule may cover before it is considered invalid (5 minutes)
pub const MIN_SCHEDULE_SECS: i64 = 5 * 60;

/// Default period of the reconciliation poll
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Default lead time for "schedule starts soon" reminders
pub const DEFAULT_REMINDER_LEAD_MINUTES: u32 = 10;

/// Weekday numbering used by schedules: Sunday = 1 ... Saturday = 7
pub const FIRST_WEEKDAY: u8 = 1;
pub const LAST_WEEKDAY: u8 = 7;

/// Maximum configuration (mode) name length
pub const MAX_CONFIG_NAME_LEN: usize = 100;

/// Storage key of the serialized schedule collection
pub const SCHEDULES_KEY: &str = "all_schedules";
