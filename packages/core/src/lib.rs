//! NoteCanvas Core State Layer
//!
//! This crate provides the client-side state management, persistence and
//! sync core for the NoteCanvas spatial note-taking app: notes on an
//! infinite 2D canvas, clusters, typed links and `[[Title]]` wiki
//! references.
//!
//! # Architecture
//!
//! - **Optimistic-first**: every mutation lands in memory synchronously;
//!   persistence and remote sync follow fire-and-forget
//! - **JSON rows**: entities persist as JSON documents keyed by ID
//! - **libsql/Turso**: embedded SQLite-compatible database for the
//!   durable local tables
//! - **Last-writer-wins**: remote snapshots merge per-note by `modified`
//!   timestamp, remote priority on ties
//!
//! # Modules
//!
//! - [`models`] - Data structures (Note, Cluster, Link, Viewport)
//! - [`services`] - Business services (CanvasService, reference resolver,
//!   link reconciliation)
//! - [`db`] - Database layer with libsql integration
//! - [`sync`] - Remote gateway abstraction and merge policy

pub mod db;
pub mod models;
pub mod services;
pub mod sync;

// Re-export commonly used types
pub use models::*;
pub use services::*;
pub use sync::{InMemoryGateway, RemoteGateway, RemotePresence};
