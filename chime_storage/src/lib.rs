mod history_log;
mod key_value;
mod time_store;

pub use history_log::{HISTORY_CAPACITY, HISTORY_KEY, HistoryLog};
pub use key_value::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, StorageError, load_json, save_json};
pub use time_store::{TIMES_KEY, TimeStore, TimeStoreError};
