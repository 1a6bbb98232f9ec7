pub mod block_state;
pub mod schedule;
pub mod selection;

pub use block_state::BlockState;
pub use schedule::{minute_of_day, weekday_number, ScheduleEntry};
pub use selection::AppSelection;
