use chime_models::{chrono::NaiveDateTime, reminder_time::ReminderTime};

use crate::occurrence::occurrence;

pub const NO_OCCURRENCE: &str = "--:--";

/// The soonest occurrence across all reminder times, `None` when there are none.
pub fn next_occurrence(times: &[ReminderTime], now: NaiveDateTime) -> Option<NaiveDateTime> {
    times.iter().map(|time| occurrence(time, now)).min()
}

pub fn format_next(next: Option<NaiveDateTime>) -> String {
    match next {
        Some(at) => at.format("%I:%M %p").to_string(),
        None => NO_OCCURRENCE.to_string(),
    }
}
