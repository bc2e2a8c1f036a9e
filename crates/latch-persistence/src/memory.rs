//! In-memory backend for the lock store
//!
//! Backs the `memory` store mode and the test suites. Records expire against
//! an `Instant` deadline; expired records are treated as absent everywhere
//! and reaped lazily on access, so no background task is required.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::store::{DeleteOutcome, LockStore};

struct MemoryRecord {
    fields: HashMap<String, String>,
    expires_at: Option<Instant>,
}

impl MemoryRecord {
    fn new(fields: &[(String, String)]) -> Self {
        Self {
            fields: fields.iter().cloned().collect(),
            expires_at: None,
        }
    }

    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

fn deadline(seconds: u64) -> Instant {
    Instant::now() + Duration::from_secs(seconds)
}

/// Process-local lock store.
#[derive(Default)]
pub struct MemoryLockStore {
    records: DashMap<String, MemoryRecord>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the record if it has expired, mirroring store-driven expiry.
    fn reap_if_expired(&self, key: &str) {
        self.records.remove_if(key, |_, record| record.is_expired());
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn exists(&self, key: &str) -> anyhow::Result<bool> {
        self.reap_if_expired(key);
        Ok(self.records.contains_key(key))
    }

    async fn set_fields(&self, key: &str, fields: &[(String, String)]) -> anyhow::Result<()> {
        self.records.insert(key.to_string(), MemoryRecord::new(fields));
        Ok(())
    }

    async fn set_expiry(&self, key: &str, seconds: u64) -> anyhow::Result<()> {
        if let Some(mut record) = self.records.get_mut(key) {
            record.expires_at = Some(deadline(seconds));
        }
        Ok(())
    }

    async fn get_field(&self, key: &str, field: &str) -> anyhow::Result<Option<String>> {
        self.reap_if_expired(key);
        Ok(self
            .records
            .get(key)
            .and_then(|record| record.fields.get(field).cloned()))
    }

    async fn get_all_fields(&self, key: &str) -> anyhow::Result<HashMap<String, String>> {
        self.reap_if_expired(key);
        Ok(self
            .records
            .get(key)
            .map(|record| record.fields.clone())
            .unwrap_or_default())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.records.remove(key);
        Ok(())
    }

    async fn keys_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut expired = Vec::new();
        for entry in self.records.iter() {
            if entry.value().is_expired() {
                expired.push(entry.key().clone());
            } else if entry.key().starts_with(prefix) {
                keys.push(entry.key().clone());
            }
        }
        for key in &expired {
            self.reap_if_expired(key);
        }
        Ok(keys)
    }

    async fn create_if_absent(
        &self,
        key: &str,
        fields: &[(String, String)],
        ttl_seconds: u64,
    ) -> anyhow::Result<bool> {
        let mut record = MemoryRecord::new(fields);
        record.expires_at = Some(deadline(ttl_seconds));

        match self.records.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.insert(record);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(record);
                Ok(true)
            }
        }
    }

    async fn delete_if_owner(
        &self,
        key: &str,
        owner_field: &str,
        expected_owner: &str,
    ) -> anyhow::Result<DeleteOutcome> {
        let removed = self.records.remove_if(key, |_, record| {
            !record.is_expired()
                && record.fields.get(owner_field).map(String::as_str) == Some(expected_owner)
        });
        if removed.is_some() {
            return Ok(DeleteOutcome::Deleted);
        }

        self.reap_if_expired(key);
        Ok(if self.records.contains_key(key) {
            DeleteOutcome::OwnerMismatch
        } else {
            DeleteOutcome::Missing
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner_fields(owner: &str) -> Vec<(String, String)> {
        vec![
            ("owner".to_string(), owner.to_string()),
            ("acquired_at".to_string(), "2024-01-01 00:00:00".to_string()),
        ]
    }

    #[tokio::test]
    async fn test_set_and_get_fields() {
        let store = MemoryLockStore::new();

        store.set_fields("object:1", &owner_fields("alice")).await.unwrap();

        assert!(store.exists("object:1").await.unwrap());
        assert_eq!(
            store.get_field("object:1", "owner").await.unwrap(),
            Some("alice".to_string())
        );
        assert_eq!(store.get_field("object:1", "missing").await.unwrap(), None);

        let fields = store.get_all_fields("object:1").await.unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("owner"), Some(&"alice".to_string()));
    }

    #[tokio::test]
    async fn test_absent_record_reads() {
        let store = MemoryLockStore::new();

        assert!(!store.exists("object:1").await.unwrap());
        assert_eq!(store.get_field("object:1", "owner").await.unwrap(), None);
        assert!(store.get_all_fields("object:1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryLockStore::new();

        store.set_fields("object:1", &owner_fields("alice")).await.unwrap();
        store.delete("object:1").await.unwrap();
        assert!(!store.exists("object:1").await.unwrap());

        // Deleting again is not an error
        store.delete("object:1").await.unwrap();
    }

    #[tokio::test]
    async fn test_keys_by_prefix() {
        let store = MemoryLockStore::new();

        store.set_fields("object:1", &owner_fields("alice")).await.unwrap();
        store.set_fields("object:2", &owner_fields("bob")).await.unwrap();
        store.set_fields("other:3", &owner_fields("mary")).await.unwrap();

        let mut keys = store.keys_by_prefix("object:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["object:1", "object:2"]);
    }

    #[tokio::test]
    async fn test_expiry_hides_record() {
        let store = MemoryLockStore::new();

        store.set_fields("object:1", &owner_fields("alice")).await.unwrap();
        store.set_expiry("object:1", 0).await.unwrap();

        assert!(!store.exists("object:1").await.unwrap());
        assert!(store.keys_by_prefix("object:").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_if_absent() {
        let store = MemoryLockStore::new();

        assert!(store.create_if_absent("object:1", &owner_fields("alice"), 900).await.unwrap());
        // Second create fails while the record is live
        assert!(!store.create_if_absent("object:1", &owner_fields("bob"), 900).await.unwrap());
        // First writer's fields are untouched
        assert_eq!(
            store.get_field("object:1", "owner").await.unwrap(),
            Some("alice".to_string())
        );
    }

    #[tokio::test]
    async fn test_create_if_absent_over_expired_record() {
        let store = MemoryLockStore::new();

        assert!(store.create_if_absent("object:1", &owner_fields("alice"), 0).await.unwrap());
        assert!(store.create_if_absent("object:1", &owner_fields("bob"), 900).await.unwrap());
        assert_eq!(
            store.get_field("object:1", "owner").await.unwrap(),
            Some("bob".to_string())
        );
    }

    #[tokio::test]
    async fn test_delete_if_owner() {
        let store = MemoryLockStore::new();

        store.create_if_absent("object:1", &owner_fields("alice"), 900).await.unwrap();

        assert_eq!(
            store.delete_if_owner("object:1", "owner", "bob").await.unwrap(),
            DeleteOutcome::OwnerMismatch
        );
        assert!(store.exists("object:1").await.unwrap());

        assert_eq!(
            store.delete_if_owner("object:1", "owner", "alice").await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            store.delete_if_owner("object:1", "owner", "alice").await.unwrap(),
            DeleteOutcome::Missing
        );
    }
}
