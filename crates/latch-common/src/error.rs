//! Error types for Latch
//!
//! Every lock operation resolves to exactly one `LockError` variant on
//! failure; the HTTP layer maps each variant to a single status code.

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum LockError {
    /// The requester identity header was missing or empty.
    #[error("request did not contain a From header")]
    MissingIdentity,

    /// A live lock record already exists for the object.
    #[error("object already locked")]
    AlreadyLocked,

    /// No lock record exists for the object.
    #[error("object not locked")]
    NotLocked,

    /// The requester is not the identity that acquired the lock.
    #[error("you ({requested_by}) are not the lock holder ({held_by})")]
    NotOwner {
        requested_by: String,
        held_by: String,
    },

    /// Any backing-store communication or protocol failure.
    #[error("store error: {0}")]
    Store(String),
}

impl From<anyhow::Error> for LockError {
    fn from(value: anyhow::Error) -> Self {
        LockError::Store(value.to_string())
    }
}
