//! Schedule persistence and save-time conflict detection.

pub mod conflict;
pub mod store;

pub use conflict::{windows_overlap, ConflictChecker};
pub use store::{ActiveSchedules, ScheduleStore};
