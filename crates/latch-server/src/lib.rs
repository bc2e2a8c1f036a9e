//! Latch Server - HTTP surface for the lock service
//!
//! Routes:
//! - GET `/` - list all current object locks
//! - GET `/{id}` - acquire a lock on the object
//! - DELETE `/{id}` - release a lock on the object

pub mod api;
pub mod model;
pub mod startup;
