//! Market-hours-aware session scheduling.
//!
//! Gates a capture session on the trading calendar, fires capture and
//! underlying-price jobs at a declarative set of Eastern times-of-day, and
//! shuts down a fixed grace period after the official close. At most one
//! invocation is in flight at a time; an overlapping fire is skipped.

pub mod schedule;
pub mod scheduler;

pub use schedule::{JobKind, Schedule, ScheduleEntry};
pub use scheduler::{SchedulerState, SessionScheduler};
