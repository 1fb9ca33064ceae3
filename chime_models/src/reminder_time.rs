use std::{fmt, str::FromStr};

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time \"{0}\", expected HH:MM")]
pub struct TimeParseError(pub String);

/// Time of day a reminder fires at, every day, in the host wall clock.
///
/// Minute precision. The canonical form is zero-padded `HH:MM`, which is also
/// the persisted representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReminderTime(NaiveTime);

impl ReminderTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn from_time(time: NaiveTime) -> Self {
        let normalized_time = time
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .expect("Will never fail.");
        Self(normalized_time)
    }

    pub fn time(&self) -> &NaiveTime {
        &self.0
    }
}

impl fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

/// Accepts `H:M`, `HH:M`, `H:MM` and `HH:MM`, surrounding whitespace ignored.
impl FromStr for ReminderTime {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TimeParseError(s.to_string());

        let (hours, minutes) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour = parse_component(hours).ok_or_else(invalid)?;
        let minute = parse_component(minutes).ok_or_else(invalid)?;

        Self::new(hour, minute).ok_or_else(invalid)
    }
}

fn parse_component(part: &str) -> Option<u32> {
    if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    part.parse().ok()
}

impl TryFrom<String> for ReminderTime {
    type Error = TimeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReminderTime> for String {
    fn from(value: ReminderTime) -> Self {
        value.to_string()
    }
}
