//! Business Logic Services
//!
//! This module contains the canvas domain logic:
//! - `canvas_service`: the reactive domain store owning all entity state
//! - `references`: `[[Title]]` wiki-reference parsing and resolution
//! - `link_sync`: pure reference-to-link reconciliation
//! - `spatial`: selection hit-testing, drag deltas and centroids
//! - `events`: domain events broadcast after every mutation

pub mod canvas_service;
pub mod error;
pub mod events;
pub mod link_sync;
pub mod references;
pub mod spatial;

#[cfg(test)]
mod canvas_service_test;

pub use canvas_service::{CanvasService, ExportData, ExportPayload, ImportSummary, PushSummary};
pub use error::{CanvasServiceError, ImportError};
pub use events::DomainEvent;
pub use references::ContentPart;
