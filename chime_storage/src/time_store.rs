use std::sync::Arc;

use chime_models::reminder_time::{ReminderTime, TimeParseError};
use thiserror::Error;

use crate::key_value::{KeyValueStore, load_json, save_json};

pub const TIMES_KEY: &str = "reminder_times";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeStoreError {
    #[error(transparent)]
    InvalidFormat(#[from] TimeParseError),

    #[error("Time {0} is already scheduled")]
    Duplicate(ReminderTime),
}

/// The user's reminder times: unique, sorted ascending, persisted as a whole
/// on every change.
pub struct TimeStore {
    store: Arc<dyn KeyValueStore>,
    times: Vec<ReminderTime>,
}

impl TimeStore {
    /// Loads the persisted set. Anything unreadable starts the store empty.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let mut times: Vec<ReminderTime> = load_json(store.as_ref(), TIMES_KEY)
            .await
            .unwrap_or_default();
        times.sort();
        times.dedup();

        log::info!("Loaded {} reminder time(s)", times.len());

        Self { store, times }
    }

    pub async fn add(&mut self, raw_time: &str) -> Result<ReminderTime, TimeStoreError> {
        let time: ReminderTime = raw_time.parse()?;

        match self.times.binary_search(&time) {
            Ok(_) => Err(TimeStoreError::Duplicate(time)),
            Err(position) => {
                self.times.insert(position, time);
                self.persist().await;
                Ok(time)
            }
        }
    }

    pub async fn remove(&mut self, time: &ReminderTime) -> bool {
        let Ok(position) = self.times.binary_search(time) else {
            return false;
        };

        self.times.remove(position);
        self.persist().await;
        true
    }

    pub fn list(&self) -> &[ReminderTime] {
        &self.times
    }

    pub fn contains(&self, time: &ReminderTime) -> bool {
        self.times.binary_search(time).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    async fn persist(&self) {
        if let Err(e) = save_json(self.store.as_ref(), TIMES_KEY, &self.times).await {
            log::error!("Failed to persist reminder times: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_value::InMemoryKeyValueStore;

    async fn empty_store() -> (Arc<InMemoryKeyValueStore>, TimeStore) {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        let store = TimeStore::load(kv.clone()).await;
        (kv, store)
    }

    fn rendered(store: &TimeStore) -> Vec<String> {
        store.list().iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn add_normalizes_and_sorts() {
        let (_, mut store) = empty_store().await;

        store.add("22:00").await.unwrap();
        store.add("8:5").await.unwrap();
        store.add("06:00").await.unwrap();

        assert_eq!(rendered(&store), ["06:00", "08:05", "22:00"]);
    }

    #[tokio::test]
    async fn duplicate_is_rejected_and_store_unchanged() {
        let (_, mut store) = empty_store().await;
        store.add("08:05").await.unwrap();

        let result = store.add("8:5").await;

        assert_eq!(
            result,
            Err(TimeStoreError::Duplicate(ReminderTime::new(8, 5).unwrap()))
        );
        assert_eq!(store.list().len(), 1);
    }

    #[tokio::test]
    async fn invalid_format_is_rejected() {
        let (_, mut store) = empty_store().await;

        let result = store.add("25:00").await;

        assert!(matches!(result, Err(TimeStoreError::InvalidFormat(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn remove_reports_absence() {
        let (_, mut store) = empty_store().await;
        store.add("08:05").await.unwrap();

        assert!(!store.remove(&ReminderTime::new(9, 0).unwrap()).await);
        assert!(store.remove(&ReminderTime::new(8, 5).unwrap()).await);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn mutations_are_persisted_and_reloaded() {
        let (kv, mut store) = empty_store().await;
        store.add("08:00").await.unwrap();
        store.add("06:00").await.unwrap();
        store.remove(&ReminderTime::new(8, 0).unwrap()).await;

        assert_eq!(
            kv.get(TIMES_KEY).await.unwrap().as_deref(),
            Some("[\"06:00\"]")
        );

        let reloaded = TimeStore::load(kv).await;
        assert_eq!(rendered(&reloaded), ["06:00"]);
    }

    #[tokio::test]
    async fn legacy_unpadded_data_is_normalized_on_load() {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        kv.set(TIMES_KEY, "[\"8:00\", \"06:00\", \"08:00\"]".to_string())
            .await
            .unwrap();

        let store = TimeStore::load(kv).await;

        assert_eq!(rendered(&store), ["06:00", "08:00"]);
    }

    #[tokio::test]
    async fn malformed_data_loads_as_empty() {
        for raw in ["not json", "{\"times\": []}", "[\"06:00\", \"99:99\"]", "[6]"] {
            let kv = Arc::new(InMemoryKeyValueStore::new());
            kv.set(TIMES_KEY, raw.to_string()).await.unwrap();

            let store = TimeStore::load(kv).await;

            assert!(store.is_empty(), "{raw:?} should load as empty");
        }
    }
}
