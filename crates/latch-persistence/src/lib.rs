//! Latch Persistence - backing-store adapters
//!
//! This crate provides:
//! - `LockStore`: the capability trait over the external key-value store
//! - `RedisLockStore`: the Redis backend
//! - `MemoryLockStore`: an in-memory backend for tests and standalone use
//!
//! Adapters own no lock semantics. They surface every store-layer failure to
//! the caller and never retry.

pub mod memory;
pub mod redis;
pub mod store;

pub use memory::MemoryLockStore;
pub use redis::RedisLockStore;
pub use store::{DeleteOutcome, LockStore, StoreMode};
