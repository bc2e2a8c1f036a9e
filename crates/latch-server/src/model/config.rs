//! Configuration management for the lock server
//!
//! Settings are layered: `conf/application.yml` (optional), environment
//! variables with the `latch` prefix, then command-line overrides.

use std::time::Duration;

use clap::Parser;
use config::{Config, Environment};
use latch_persistence::StoreMode;

const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_STORE_TIMEOUT_SECONDS: u64 = 5;

/// Command line arguments for the server
#[derive(Debug, Parser)]
#[command(name = "latch-server", about = "Distributed advisory lock server")]
struct Cli {
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,
    #[arg(long = "redis-url", env = "REDIS_URL")]
    redis_url: Option<String>,
    #[arg(long = "store-mode")]
    store_mode: Option<String>,
    #[arg(long = "log-dir", env = "LATCH_LOG_DIR")]
    log_dir: Option<String>,
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    pub fn new() -> Self {
        let args = Cli::parse();
        let mut config_builder = Config::builder()
            .add_source(
                Environment::with_prefix("latch")
                    .separator(".")
                    .try_parsing(true),
            )
            .add_source(config::File::with_name("conf/application").required(false));

        if let Some(v) = args.port {
            config_builder = config_builder
                .set_override("server.port", i64::from(v))
                .expect("Failed to set server port override");
        }
        if let Some(v) = args.redis_url {
            config_builder = config_builder
                .set_override("store.url", v)
                .expect("Failed to set store url override");
        }
        if let Some(v) = args.store_mode {
            config_builder = config_builder
                .set_override("store.mode", v)
                .expect("Failed to set store mode override");
        }
        if let Some(v) = args.log_dir {
            config_builder = config_builder
                .set_override("logging.dir", v)
                .expect("Failed to set log dir override");
        }

        let app_config = config_builder
            .build()
            .expect("Failed to build configuration - check conf/application.yml");

        Configuration { config: app_config }
    }

    // ========================================================================
    // Server Configuration
    // ========================================================================

    pub fn server_address(&self) -> String {
        self.config
            .get_string("server.address")
            .unwrap_or("0.0.0.0".to_string())
    }

    pub fn server_port(&self) -> u16 {
        self.config
            .get_int("server.port")
            .unwrap_or(DEFAULT_SERVER_PORT.into()) as u16
    }

    // ========================================================================
    // Store Configuration
    // ========================================================================

    pub fn store_mode(&self) -> StoreMode {
        self.config
            .get_string("store.mode")
            .ok()
            .and_then(|v| StoreMode::parse(&v))
            .unwrap_or_default()
    }

    pub fn redis_url(&self) -> String {
        self.config
            .get_string("store.url")
            .unwrap_or(DEFAULT_REDIS_URL.to_string())
    }

    /// Upper bound on a single store round trip. A hung call is cut off here
    /// and surfaced as a store error.
    pub fn store_op_timeout(&self) -> Duration {
        let seconds = self
            .config
            .get_int("store.timeout_seconds")
            .unwrap_or(DEFAULT_STORE_TIMEOUT_SECONDS as i64)
            .max(1) as u64;
        Duration::from_secs(seconds)
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    pub fn log_dir(&self) -> Option<String> {
        self.config.get_string("logging.dir").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_configuration() -> Configuration {
        Configuration {
            config: Config::builder().build().unwrap(),
        }
    }

    #[test]
    fn test_defaults() {
        let configuration = empty_configuration();

        assert_eq!(configuration.server_address(), "0.0.0.0");
        assert_eq!(configuration.server_port(), 3000);
        assert_eq!(configuration.store_mode(), StoreMode::Redis);
        assert_eq!(configuration.redis_url(), "redis://127.0.0.1:6379");
        assert_eq!(configuration.store_op_timeout(), Duration::from_secs(5));
        assert_eq!(configuration.log_dir(), None);
    }

    #[test]
    fn test_overrides() {
        let config = Config::builder()
            .set_override("server.port", 8080)
            .unwrap()
            .set_override("store.mode", "memory")
            .unwrap()
            .set_override("store.timeout_seconds", 2)
            .unwrap()
            .build()
            .unwrap();
        let configuration = Configuration { config };

        assert_eq!(configuration.server_port(), 8080);
        assert_eq!(configuration.store_mode(), StoreMode::Memory);
        assert_eq!(configuration.store_op_timeout(), Duration::from_secs(2));
    }
}
