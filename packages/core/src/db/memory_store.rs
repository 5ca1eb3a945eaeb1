//! In-process `BackingStore` used by tests, benchmarks and the demo binary.
//!
//! Records live in a `HashMap`, so `fetch` returns them in arbitrary order.
//! `sync` only counts and clears pending changes; failures can be injected with
//! `fail_next_sync` to exercise error propagation.

use crate::db::{BackingStore, RecordQuery, StoreError, StoredRecord};
use crate::models::NodeType;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::time::{sleep, Duration};
use uuid::Uuid;

pub struct MemoryStore {
    records: Mutex<HashMap<String, StoredRecord>>,
    pending_changes: AtomicUsize,
    sync_count: AtomicUsize,
    sync_failure: Mutex<Option<StoreError>>,
    sync_delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            pending_changes: AtomicUsize::new(0),
            sync_count: AtomicUsize::new(0),
            sync_failure: Mutex::new(None),
            sync_delay: None,
        }
    }

    /// Store whose `sync` sleeps for `delay` before completing
    pub fn with_sync_delay(delay: Duration) -> Self {
        Self {
            sync_delay: Some(delay),
            ..Self::new()
        }
    }

    /// Make the next `sync` call fail with `SyncFailed(message)`
    pub fn fail_next_sync(&self, message: impl Into<String>) -> Result<(), StoreError> {
        *self.lock_failure()? = Some(StoreError::sync_failed(message));
        Ok(())
    }

    /// Local changes not yet synced
    pub fn pending_changes(&self) -> usize {
        self.pending_changes.load(Ordering::SeqCst)
    }

    /// Number of successful syncs
    pub fn sync_count(&self) -> usize {
        self.sync_count.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.lock_records().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_records(&self) -> Result<MutexGuard<'_, HashMap<String, StoredRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::storage("Failed to acquire lock"))
    }

    fn lock_failure(&self) -> Result<MutexGuard<'_, Option<StoreError>>, StoreError> {
        self.sync_failure
            .lock()
            .map_err(|_| StoreError::storage("Failed to acquire lock"))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackingStore for MemoryStore {
    fn get(&self, id: &str) -> Result<Option<StoredRecord>, StoreError> {
        Ok(self.lock_records()?.get(id).cloned())
    }

    fn set(
        &self,
        id: Option<&str>,
        node_type: &NodeType,
        properties: Value,
    ) -> Result<StoredRecord, StoreError> {
        if !properties.is_object() {
            return Err(StoreError::storage("record properties must be a JSON object"));
        }

        let mut records = self.lock_records()?;
        let now = Utc::now();
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let record = match records.get_mut(&id) {
            Some(existing) => {
                if let (Some(target), Some(updates)) =
                    (existing.properties.as_object_mut(), properties.as_object())
                {
                    for (key, value) in updates {
                        target.insert(key.clone(), value.clone());
                    }
                }
                existing.node_type = node_type.clone();
                existing.modified_at = now;
                existing.clone()
            }
            None => {
                let record = StoredRecord {
                    id: id.clone(),
                    node_type: node_type.clone(),
                    properties,
                    created_at: now,
                    modified_at: now,
                };
                records.insert(id, record.clone());
                record
            }
        };

        self.pending_changes.fetch_add(1, Ordering::SeqCst);
        Ok(record)
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let existed = self.lock_records()?.remove(id).is_some();
        if existed {
            self.pending_changes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(existed)
    }

    async fn fetch(&self, query: RecordQuery) -> Result<Vec<StoredRecord>, StoreError> {
        let records = self.lock_records()?;
        Ok(records
            .values()
            .filter(|record| query.matches(record))
            .cloned()
            .collect())
    }

    async fn sync(&self) -> Result<(), StoreError> {
        if let Some(delay) = self.sync_delay {
            sleep(delay).await;
        }

        if let Some(error) = self.lock_failure()?.take() {
            tracing::warn!("Sync failed with {} pending change(s): {}", self.pending_changes(), error);
            return Err(error);
        }

        let flushed = self.pending_changes.swap(0, Ordering::SeqCst);
        self.sync_count.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Synced {} change(s)", flushed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_allocates_id() {
        let store = MemoryStore::new();
        let a = store.set(None, &NodeType::Text, json!({})).unwrap();
        let b = store.set(None, &NodeType::Text, json!({})).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
        assert_eq!(store.pending_changes(), 2);
    }

    #[test]
    fn test_set_merges_existing() {
        let store = MemoryStore::new();
        let record = store
            .set(None, &NodeType::Text, json!({ "content": "a", "lang": "en" }))
            .unwrap();
        let updated = store
            .set(Some(&record.id), &NodeType::Text, json!({ "content": "b" }))
            .unwrap();
        assert_eq!(updated.properties, json!({ "content": "b", "lang": "en" }));
        assert_eq!(updated.created_at, record.created_at);
    }

    #[test]
    fn test_set_rejects_non_object() {
        let store = MemoryStore::new();
        assert!(store.set(None, &NodeType::Text, json!(42)).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete() {
        let store = MemoryStore::new();
        let record = store.set(None, &NodeType::Code, json!({})).unwrap();
        assert!(store.delete(&record.id).unwrap());
        assert!(!store.delete(&record.id).unwrap());
        assert!(store.get(&record.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sync_clears_pending() {
        let store = MemoryStore::new();
        store.set(None, &NodeType::Text, json!({})).unwrap();
        store.sync().await.unwrap();
        assert_eq!(store.pending_changes(), 0);
        assert_eq!(store.sync_count(), 1);
    }

    #[tokio::test]
    async fn test_injected_sync_failure_is_one_shot() {
        let store = MemoryStore::new();
        store.set(None, &NodeType::Text, json!({})).unwrap();
        store.fail_next_sync("offline").unwrap();

        let err = store.sync().await.unwrap_err();
        assert_eq!(err, StoreError::SyncFailed("offline".to_string()));
        assert_eq!(store.pending_changes(), 1);

        store.sync().await.unwrap();
        assert_eq!(store.pending_changes(), 0);
    }

    #[tokio::test]
    async fn test_fetch_filters() {
        let store = MemoryStore::new();
        store.set(None, &NodeType::Text, json!({})).unwrap();
        store
            .set(None, &NodeType::Comment, json!({ "node": "n1" }))
            .unwrap();

        let comments = store
            .fetch(RecordQuery::new().with_type(NodeType::Comment))
            .await
            .unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(store.fetch(RecordQuery::new()).await.unwrap().len(), 2);
    }
}
