//! Lock API handlers
//!
//! Implements the lock service HTTP endpoints:
//! - GET `/` - list all current object locks as a JSON array of `{id, by, at}`
//! - GET `/{id}` - acquire a lock on the object, 201 on success
//! - DELETE `/{id}` - release a lock on the object, 200 on success
//!
//! The requester identity is the literal value of the `From` request header,
//! used verbatim as the lock owner. Each failure maps to exactly one status
//! code with a short plain-text message.

use actix_web::{HttpRequest, HttpResponse, delete, get, web};
use tracing::{error, info};

use latch_common::LockError;

use crate::model::common::AppState;

/// Request header carrying the requester identity.
const FROM_HEADER: &str = "From";

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_locks)
        .service(acquire_lock)
        .service(release_lock);
}

/// List all current object locks
///
/// GET /
#[get("/")]
pub async fn list_locks(data: web::Data<AppState>) -> HttpResponse {
    match data.lock_service.list().await {
        Ok(locks) => HttpResponse::Ok().json(locks),
        Err(e) => {
            error!(error = %e, "Failed to list locks");
            error_response(e)
        }
    }
}

/// Acquire a lock on the object
///
/// GET /{id}
#[get("/{id}")]
pub async fn acquire_lock(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let id = path.into_inner();
    match data.lock_service.acquire(&id, requester(&req)).await {
        Ok(lock) => {
            info!(id = %lock.id, owner = %lock.owner, "Lock acquired");
            HttpResponse::Created().finish()
        }
        Err(e) => {
            if let LockError::Store(_) = e {
                error!(id = %id, error = %e, "Failed to acquire lock");
            }
            error_response(e)
        }
    }
}

/// Release a lock on the object
///
/// DELETE /{id}
#[delete("/{id}")]
pub async fn release_lock(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let id = path.into_inner();
    match data.lock_service.release(&id, requester(&req)).await {
        Ok(()) => {
            info!(id = %id, "Lock released");
            HttpResponse::Ok().finish()
        }
        Err(e) => {
            if let LockError::Store(_) = e {
                error!(id = %id, error = %e, "Failed to release lock");
            }
            error_response(e)
        }
    }
}

/// Extract the requester identity, verbatim and unvalidated.
fn requester(req: &HttpRequest) -> Option<&str> {
    req.headers().get(FROM_HEADER).and_then(|v| v.to_str().ok())
}

fn error_response(err: LockError) -> HttpResponse {
    let message = err.to_string();
    match err {
        LockError::MissingIdentity => HttpResponse::BadRequest().body(message),
        LockError::AlreadyLocked => HttpResponse::Conflict().body(message),
        LockError::NotLocked => HttpResponse::NotFound().body(message),
        LockError::NotOwner { .. } => HttpResponse::Forbidden().body(message),
        LockError::Store(_) => HttpResponse::InternalServerError().body(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::http::StatusCode;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_response(LockError::MissingIdentity).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(LockError::AlreadyLocked).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_response(LockError::NotLocked).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_response(LockError::NotOwner {
                requested_by: "bob".to_string(),
                held_by: "alice".to_string(),
            })
            .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            error_response(LockError::Store("boom".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
