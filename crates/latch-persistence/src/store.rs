//! Capability trait for the backing key-value store
//!
//! The store is an external collaborator: a networked key-value service
//! providing existence checks, field storage, expiry, deletion, and prefix
//! enumeration. The service layer depends only on this trait and receives a
//! concrete backend by injection.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use async_trait::async_trait;

/// Outcome of an ownership-checked conditional delete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The record existed with the expected owner and was deleted.
    Deleted,
    /// The record exists but is held by a different owner; nothing was deleted.
    OwnerMismatch,
    /// No record exists under the key.
    Missing,
}

/// Backing-store capability interface.
///
/// Each operation maps to one store round trip and surfaces any
/// communication or protocol failure to the caller. Adapters never retry.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// True if a record with this key currently exists.
    async fn exists(&self, key: &str) -> anyhow::Result<bool>;

    /// Create or overwrite the record's field set.
    async fn set_fields(&self, key: &str, fields: &[(String, String)]) -> anyhow::Result<()>;

    /// Mark the record to auto-delete after the given number of seconds.
    async fn set_expiry(&self, key: &str, seconds: u64) -> anyhow::Result<()>;

    /// Read one field; `None` if the record or field is absent.
    async fn get_field(&self, key: &str, field: &str) -> anyhow::Result<Option<String>>;

    /// Read all fields of a record; empty map if the record is absent.
    async fn get_all_fields(&self, key: &str) -> anyhow::Result<HashMap<String, String>>;

    /// Remove the record. Deleting a non-existent key is not an error.
    async fn delete(&self, key: &str) -> anyhow::Result<()>;

    /// Enumerate all keys under the prefix at call time (snapshot, not live).
    async fn keys_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<String>>;

    /// Atomically create the record with its field set and expiry iff the key
    /// does not already exist. Returns `false` if it did.
    async fn create_if_absent(
        &self,
        key: &str,
        fields: &[(String, String)],
        ttl_seconds: u64,
    ) -> anyhow::Result<bool>;

    /// Atomically delete the record iff `owner_field` still holds
    /// `expected_owner` at delete time.
    async fn delete_if_owner(
        &self,
        key: &str,
        owner_field: &str,
        expected_owner: &str,
    ) -> anyhow::Result<DeleteOutcome>;
}

/// Which backend the server coordinates through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreMode {
    /// Shared external Redis instance.
    #[default]
    Redis,
    /// Process-local in-memory store. Locks do not survive restarts and are
    /// not visible to other server instances.
    Memory,
}

impl StoreMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "redis" => Some(StoreMode::Redis),
            "memory" => Some(StoreMode::Memory),
            _ => None,
        }
    }
}

impl Display for StoreMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreMode::Redis => write!(f, "redis"),
            StoreMode::Memory => write!(f, "memory"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_mode_parse() {
        assert_eq!(StoreMode::parse("redis"), Some(StoreMode::Redis));
        assert_eq!(StoreMode::parse("Memory"), Some(StoreMode::Memory));
        assert_eq!(StoreMode::parse("rocksdb"), None);
    }

    #[test]
    fn test_store_mode_display() {
        assert_eq!(StoreMode::Redis.to_string(), "redis");
        assert_eq!(StoreMode::Memory.to_string(), "memory");
    }
}
