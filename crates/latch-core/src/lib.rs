//! Latch Core - the lock lifecycle service
//!
//! Implements the three lock operations (list, acquire, release) over an
//! injected backing store. All cross-request coordination is delegated to
//! the store; the service holds no in-process locking.

pub mod service;

pub use service::LockService;
