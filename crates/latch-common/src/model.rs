//! Domain model for locks
//!
//! A lock is one record in the backing store, keyed by a namespaced encoding
//! of the object id. The record's existence IS the lock: release deletes it,
//! expiry auto-deletes it, and there is no update-in-place.

use serde::{Deserialize, Serialize};

/// Key namespace for lock records. One prefix for all operations, point
/// lookups and enumeration alike.
pub const LOCK_KEY_PREFIX: &str = "object:";

/// Record field holding the lock owner identity.
pub const FIELD_OWNER: &str = "owner";

/// Record field holding the acquisition timestamp.
pub const FIELD_ACQUIRED_AT: &str = "acquired_at";

/// Fixed lock validity window in seconds. Not renewable.
pub const LOCK_TTL_SECONDS: u64 = 15 * 60;

/// Wall-clock format for the `acquired_at` field, stored and echoed verbatim.
pub const ACQUIRED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An acquired lock on a named object.
///
/// `owner` is the verbatim requester identity that acquired the lock and is
/// immutable for the life of the lock instance. The wire shape uses the
/// short `by`/`at` field names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    pub id: String,
    #[serde(rename = "by")]
    pub owner: String,
    #[serde(rename = "at")]
    pub acquired_at: String,
}

/// Encode an object id into its store key.
pub fn lock_key(id: &str) -> String {
    format!("{}{}", LOCK_KEY_PREFIX, id)
}

/// Decode an object id from a store key, if the key is in the lock namespace.
pub fn lock_id_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(LOCK_KEY_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip() {
        assert_eq!(lock_key("42"), "object:42");
        assert_eq!(lock_id_from_key("object:42"), Some("42"));
        assert_eq!(lock_id_from_key("document:42"), None);
    }

    #[test]
    fn test_lock_wire_shape() {
        let lock = Lock {
            id: "123".to_string(),
            owner: "john@company.com".to_string(),
            acquired_at: "2010-09-27 10:32:21".to_string(),
        };

        let json = serde_json::to_value(&lock).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "123",
                "by": "john@company.com",
                "at": "2010-09-27 10:32:21",
            })
        );
    }

    #[test]
    fn test_ttl_is_fifteen_minutes() {
        assert_eq!(LOCK_TTL_SECONDS, 900);
    }
}
