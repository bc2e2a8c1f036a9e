//! Server startup: logging initialization and HTTP server construction.

pub mod http;
pub mod logging;

pub use http::lock_server;
pub use logging::init_logging;
