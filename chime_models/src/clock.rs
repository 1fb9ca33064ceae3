use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, Utc};
use thiserror::Error;

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct FixedClock(Arc<Mutex<DateTime<Utc>>>);

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(now)))
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.lock();
        *now += delta;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown timezone \"{0}\", expected \"local\" or an IANA name")]
pub struct UnknownTimezone(pub String);

/// Which wall clock reminder times are interpreted in.
///
/// `Local` follows the host timezone and picks up changes to it on the next
/// resync. `Fixed` pins every schedule to one zone regardless of where the
/// host currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimezonePolicy {
    #[default]
    Local,
    Fixed(chrono_tz::Tz),
}

impl TimezonePolicy {
    pub fn wall_clock(&self, now: DateTime<Utc>) -> NaiveDateTime {
        match self {
            TimezonePolicy::Local => now.with_timezone(&Local).naive_local(),
            TimezonePolicy::Fixed(tz) => now.with_timezone(tz).naive_local(),
        }
    }
}

impl FromStr for TimezonePolicy {
    type Err = UnknownTimezone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("local") {
            return Ok(TimezonePolicy::Local);
        }

        name.parse::<chrono_tz::Tz>()
            .map(TimezonePolicy::Fixed)
            .map_err(|_| UnknownTimezone(s.to_string()))
    }
}
