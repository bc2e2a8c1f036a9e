//! HTTP server setup for the lock API.

use std::sync::Arc;

use actix_web::{App, HttpServer, dev::Server, middleware::Logger, web};

use crate::api;
use crate::model::common::AppState;

/// Creates and binds the lock HTTP server.
///
/// Routes live at the root path: any GET path segment is an object id, so
/// the API surface is exactly the three lock routes and nothing else.
pub fn lock_server(
    app_state: Arc<AppState>,
    address: String,
    port: u16,
) -> Result<Server, std::io::Error> {
    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::from(app_state.clone()))
            .configure(api::lock::routes)
    })
    .bind((address, port))?
    .run())
}
