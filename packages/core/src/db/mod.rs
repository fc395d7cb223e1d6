//! Local Persistence Layer
//!
//! This module handles the durable on-device store backing the in-memory
//! canvas state:
//!
//! - Database initialization and connection management (embedded libsql)
//! - One `(id, data, modified)` JSON table per entity type
//! - Bulk replace for the import/restore path
//!
//! The in-memory state owned by `CanvasService` is authoritative during a
//! session; this layer is its write-behind mirror and the source of state
//! on the next startup.

mod database;
mod error;
mod local_store;

pub use database::DatabaseService;
pub use error::DatabaseError;
pub use local_store::{LocalStore, TursoStore};
