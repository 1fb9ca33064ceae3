pub mod clock;
pub mod history;
pub mod permission;
pub mod reminder_time;
pub mod settings;

pub use chrono;
pub use chrono_tz;
