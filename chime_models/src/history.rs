use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One notification that was shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub message: String,
    pub fired_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(message: impl Into<String>, fired_at: DateTime<Utc>) -> Self {
        Self {
            message: message.into(),
            fired_at,
        }
    }
}
