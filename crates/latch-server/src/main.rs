//! Main entry point for the Latch lock server.
//!
//! Sets up configuration, logging, and the backing store, then starts the
//! HTTP server.

use std::sync::Arc;

use latch_core::LockService;
use latch_persistence::{LockStore, MemoryLockStore, RedisLockStore, StoreMode};
use latch_server::{
    model::{common::AppState, config::Configuration},
    startup,
};
use tracing::info;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let configuration = Configuration::new();

    let _logging_guard = startup::init_logging(configuration.log_dir().as_deref())?;

    let store: Arc<dyn LockStore> = match configuration.store_mode() {
        StoreMode::Redis => {
            let url = configuration.redis_url();
            info!("Coordinating through redis at {}", url);
            Arc::new(RedisLockStore::connect(&url, configuration.store_op_timeout()).await?)
        }
        StoreMode::Memory => {
            info!("Coordinating through the in-memory store; locks do not survive restarts");
            Arc::new(MemoryLockStore::new())
        }
    };

    let app_state = Arc::new(AppState::new(LockService::new(store)));

    let address = configuration.server_address();
    let port = configuration.server_port();
    info!("Lock server running at http://{}:{}/", address, port);

    startup::lock_server(app_state, address, port)?.await?;

    Ok(())
}
