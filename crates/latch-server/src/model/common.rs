//! Shared application state for HTTP handlers

use latch_core::LockService;

/// State shared across all in-flight requests.
pub struct AppState {
    pub lock_service: LockService,
}

impl AppState {
    pub fn new(lock_service: LockService) -> Self {
        Self { lock_service }
    }
}
