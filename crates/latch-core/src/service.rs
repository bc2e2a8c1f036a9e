//! Lock lifecycle operations
//!
//! Acquire and release go through the store's atomic conditional primitives,
//! so two racing acquires on one id cannot both succeed and a release can
//! never delete a lock that changed hands after the ownership check.

use std::sync::Arc;

use chrono::Utc;
use futures::future;
use tracing::debug;

use latch_common::{
    ACQUIRED_AT_FORMAT, FIELD_ACQUIRED_AT, FIELD_OWNER, LOCK_KEY_PREFIX, LOCK_TTL_SECONDS, Lock,
    LockError, lock_id_from_key, lock_key,
};
use latch_persistence::{DeleteOutcome, LockStore};

/// Advisory lock service over a backing key-value store.
///
/// The store is an explicit constructor dependency so tests can substitute
/// an in-memory backend.
#[derive(Clone)]
pub struct LockService {
    store: Arc<dyn LockStore>,
}

impl LockService {
    pub fn new(store: Arc<dyn LockStore>) -> Self {
        Self { store }
    }

    /// List all live locks.
    ///
    /// Keys are enumerated once, then the per-key field fetches run
    /// concurrently and are joined before the result is assembled. Any
    /// enumeration or fetch failure aborts the whole operation; partial
    /// results are discarded. A record deleted or expired between
    /// enumeration and its fetch is skipped, per the non-atomic snapshot
    /// contract. Order follows store enumeration order.
    pub async fn list(&self) -> Result<Vec<Lock>, LockError> {
        let keys = self.store.keys_by_prefix(LOCK_KEY_PREFIX).await?;

        let store = &self.store;
        let records = future::try_join_all(keys.iter().map(|key| async move {
            let fields = store.get_all_fields(key).await?;
            Ok::<_, anyhow::Error>((key, fields))
        }))
        .await?;

        let mut locks = Vec::with_capacity(records.len());
        for (key, fields) in records {
            if fields.is_empty() {
                continue;
            }
            let id = lock_id_from_key(key).unwrap_or(key).to_string();
            let owner = fields
                .get(FIELD_OWNER)
                .ok_or_else(|| malformed(key, FIELD_OWNER))?;
            let acquired_at = fields
                .get(FIELD_ACQUIRED_AT)
                .ok_or_else(|| malformed(key, FIELD_ACQUIRED_AT))?;
            locks.push(Lock {
                id,
                owner: owner.clone(),
                acquired_at: acquired_at.clone(),
            });
        }
        Ok(locks)
    }

    /// Acquire an exclusive lock on `id` for the supplied requester identity.
    ///
    /// The record is created together with its 15-minute expiry in a single
    /// conditional step; if the key already held a live record the create
    /// reports a conflict and nothing is written.
    pub async fn acquire(&self, id: &str, requested_by: Option<&str>) -> Result<Lock, LockError> {
        let owner = identity(requested_by)?;

        let key = lock_key(id);
        let acquired_at = Utc::now().format(ACQUIRED_AT_FORMAT).to_string();
        let fields = vec![
            (FIELD_OWNER.to_string(), owner.to_string()),
            (FIELD_ACQUIRED_AT.to_string(), acquired_at.clone()),
        ];

        let created = self
            .store
            .create_if_absent(&key, &fields, LOCK_TTL_SECONDS)
            .await?;
        if !created {
            return Err(LockError::AlreadyLocked);
        }

        debug!(id = %id, owner = %owner, "Lock acquired");
        Ok(Lock {
            id: id.to_string(),
            owner: owner.to_string(),
            acquired_at,
        })
    }

    /// Release the lock on `id`, provided the supplied identity acquired it.
    ///
    /// Check precedence: no record beats missing identity beats wrong owner.
    /// The delete re-verifies ownership atomically, so a lock re-acquired by
    /// someone else after the check stays intact; a record that expired
    /// between check and delete counts as released (delete is idempotent).
    pub async fn release(&self, id: &str, requested_by: Option<&str>) -> Result<(), LockError> {
        let key = lock_key(id);
        if !self.store.exists(&key).await? {
            return Err(LockError::NotLocked);
        }

        let owner = identity(requested_by)?;

        let held_by = match self.store.get_field(&key, FIELD_OWNER).await? {
            Some(held_by) => held_by,
            // Expired between the existence check and the read
            None => return Err(LockError::NotLocked),
        };
        if held_by != owner {
            return Err(LockError::NotOwner {
                requested_by: owner.to_string(),
                held_by,
            });
        }

        match self.store.delete_if_owner(&key, FIELD_OWNER, owner).await? {
            DeleteOutcome::Deleted | DeleteOutcome::Missing => {
                debug!(id = %id, owner = %owner, "Lock released");
                Ok(())
            }
            DeleteOutcome::OwnerMismatch => {
                let held_by = self
                    .store
                    .get_field(&key, FIELD_OWNER)
                    .await?
                    .unwrap_or_default();
                Err(LockError::NotOwner {
                    requested_by: owner.to_string(),
                    held_by,
                })
            }
        }
    }
}

fn identity(requested_by: Option<&str>) -> Result<&str, LockError> {
    match requested_by {
        Some(owner) if !owner.is_empty() => Ok(owner),
        _ => Err(LockError::MissingIdentity),
    }
}

fn malformed(key: &str, field: &str) -> LockError {
    LockError::Store(format!("lock record '{}' is missing the '{}' field", key, field))
}
