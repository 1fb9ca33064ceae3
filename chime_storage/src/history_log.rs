use std::{collections::VecDeque, sync::Arc};

use chime_models::{clock::Clock, history::HistoryEntry};

use crate::key_value::{KeyValueStore, load_json, save_json};

pub const HISTORY_KEY: &str = "notification_history";
pub const HISTORY_CAPACITY: usize = 50;

/// Shown notifications, newest first, capped at [`HISTORY_CAPACITY`].
pub struct HistoryLog {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    entries: VecDeque<HistoryEntry>,
}

impl HistoryLog {
    pub async fn load(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let mut entries: VecDeque<HistoryEntry> = load_json(store.as_ref(), HISTORY_KEY)
            .await
            .unwrap_or_default();
        entries.truncate(HISTORY_CAPACITY);

        Self {
            store,
            clock,
            entries,
        }
    }

    pub async fn append(&mut self, message: &str) {
        let entry = HistoryEntry::new(message, self.clock.now());
        self.entries.push_front(entry);
        self.entries.truncate(HISTORY_CAPACITY);

        if let Err(e) = save_json(self.store.as_ref(), HISTORY_KEY, &self.entries).await {
            log::error!("Failed to persist notification history: {e}");
        }
    }

    pub fn list(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_value::{InMemoryKeyValueStore, StorageError};
    use async_trait::async_trait;
    use chime_models::{
        chrono::{TimeDelta, TimeZone, Utc},
        clock::FixedClock,
    };

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn newest_entry_comes_first() {
        let clock = clock();
        let mut log = HistoryLog::load(Arc::new(InMemoryKeyValueStore::new()), Arc::new(clock.clone())).await;

        log.append("first").await;
        clock.advance(TimeDelta::minutes(1));
        log.append("second").await;

        let entries = log.list();
        assert_eq!(entries[0].message, "second");
        assert_eq!(entries[1].message, "first");
        assert!(entries[0].fired_at > entries[1].fired_at);
    }

    #[tokio::test]
    async fn cap_drops_oldest_entries() {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        let mut log = HistoryLog::load(kv.clone(), Arc::new(clock())).await;

        for i in 1..=HISTORY_CAPACITY + 1 {
            log.append(&format!("message {i}")).await;
        }

        let entries = log.list();
        assert_eq!(entries.len(), HISTORY_CAPACITY);
        assert_eq!(entries.first().unwrap().message, "message 51");
        assert_eq!(entries.last().unwrap().message, "message 2");
        assert!(entries.iter().all(|e| e.message != "message 1"));

        let reloaded = HistoryLog::load(kv, Arc::new(clock())).await;
        assert_eq!(reloaded.list(), entries);
    }

    #[tokio::test]
    async fn malformed_history_loads_empty() {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        kv.set(HISTORY_KEY, "[{\"message\": 1}]".to_string()).await.unwrap();

        let log = HistoryLog::load(kv, Arc::new(clock())).await;

        assert!(log.is_empty());
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(std::io::Error::other("disk full").into())
        }
    }

    #[tokio::test]
    async fn persistence_failure_keeps_entry_in_memory() {
        let mut log = HistoryLog::load(Arc::new(BrokenStore), Arc::new(clock())).await;

        log.append("still recorded").await;

        assert_eq!(log.len(), 1);
    }
}
