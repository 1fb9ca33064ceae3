mod occurrence;
mod scheduler;
mod status;
mod timer;

pub use occurrence::{delay_until, occurrence};
pub use scheduler::{OccurrenceScheduler, SchedulerError, SchedulerHandle};
pub use status::{format_next, next_occurrence};
pub use timer::OccurrenceState;
