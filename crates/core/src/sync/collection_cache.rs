//! Durable snapshot cache for the collection view.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::collection::CollectionItem;
use crate::errors::LocalStoreError;

/// Storage key for the serialized collection snapshot.
pub const COLLECTION_CACHE_KEY: &str = "collection.cache.v1";

/// String-keyed local persistence used as the cache backing.
pub trait LocalStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, LocalStoreError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), LocalStoreError>;
    fn remove_item(&self, key: &str) -> Result<(), LocalStoreError>;
}

/// Snapshot payload persisted by the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedCollection {
    items: Vec<CollectionItem>,
    cached_at: DateTime<Utc>,
}

/// Best-effort persistence of the last-known collection snapshot.
///
/// The cache is an optimization, not a source of truth: reads fall back to
/// `None`, writes are fire-and-forget, and there is no expiry. A stale
/// snapshot is corrected by the authoritative fetch that follows it, not by
/// discarding old data.
pub struct CollectionCache {
    store: Arc<dyn LocalStore>,
}

impl CollectionCache {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// Last persisted snapshot, or `None` on any read or decode failure.
    pub fn load(&self) -> Option<Vec<CollectionItem>> {
        let raw = match self.store.get_item(COLLECTION_CACHE_KEY) {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(err) => {
                debug!("collection cache read failed: {}", err);
                return None;
            }
        };
        match serde_json::from_str::<CachedCollection>(&raw) {
            Ok(snapshot) => Some(snapshot.items),
            Err(err) => {
                debug!("collection cache decode failed: {}", err);
                None
            }
        }
    }

    /// Persist a snapshot with a timestamp. Failures are logged, never surfaced.
    pub fn save(&self, items: &[CollectionItem]) {
        let snapshot = CachedCollection {
            items: items.to_vec(),
            cached_at: Utc::now(),
        };
        let raw = match serde_json::to_string(&snapshot) {
            Ok(value) => value,
            Err(err) => {
                warn!("collection cache encode failed: {}", err);
                return;
            }
        };
        if let Err(err) = self.store.set_item(COLLECTION_CACHE_KEY, &raw) {
            warn!("collection cache write failed: {}", err);
        }
    }

    /// Drop the snapshot. Only the resolved signed-out transition calls this.
    pub fn clear(&self) {
        if let Err(err) = self.store.remove_item(COLLECTION_CACHE_KEY) {
            warn!("collection cache clear failed: {}", err);
        }
    }
}

/// In-memory [`LocalStore`] for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryLocalStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryLocalStore {
    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocalStore for MemoryLocalStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), LocalStoreError> {
        self.entries().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{CollectionItem, ItemStatus};

    fn cache() -> (CollectionCache, Arc<MemoryLocalStore>) {
        let store = Arc::new(MemoryLocalStore::default());
        (CollectionCache::new(store.clone()), store)
    }

    #[test]
    fn empty_store_loads_nothing() {
        let (cache, _store) = cache();
        assert!(cache.load().is_none());
    }

    #[test]
    fn snapshot_round_trips() {
        let (cache, _store) = cache();
        let items = vec![CollectionItem::new_local(
            "tea-1",
            ItemStatus::WantToTry,
            None,
        )];

        cache.save(&items);
        assert_eq!(cache.load(), Some(items));
    }

    #[test]
    fn corrupt_payload_loads_as_none() {
        let (cache, store) = cache();
        store
            .set_item(COLLECTION_CACHE_KEY, "{not json")
            .expect("seed corrupt payload");
        assert!(cache.load().is_none());
    }

    #[test]
    fn clear_removes_the_snapshot() {
        let (cache, _store) = cache();
        cache.save(&[CollectionItem::new_local(
            "tea-1",
            ItemStatus::WantToTry,
            None,
        )]);

        cache.clear();
        assert!(cache.load().is_none());
    }
}
