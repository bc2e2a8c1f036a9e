//! Latch Common - shared types for the lock service
//!
//! This crate provides:
//! - `LockError`: the error taxonomy every operation resolves to
//! - `Lock`: the domain model for an acquired lock
//! - Key namespace and record field constants

pub mod error;
pub mod model;

pub use error::LockError;
pub use model::{
    ACQUIRED_AT_FORMAT, FIELD_ACQUIRED_AT, FIELD_OWNER, LOCK_KEY_PREFIX, LOCK_TTL_SECONDS, Lock,
    lock_id_from_key, lock_key,
};
