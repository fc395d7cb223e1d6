//! Data Models
//!
//! This module contains the core data structures used throughout NoteCanvas:
//!
//! - `Note` - An atomic unit of content with a world-space position
//! - `Cluster` - A named, colored grouping of notes with a centroid position
//! - `Link` - A bidirectional connection between two notes
//! - `Viewport` - Transient camera state (pan + zoom)
//!
//! All entities serialize as camelCase JSON. The same shape is used for the
//! local database columns, the remote sync payloads and the export file
//! format, so no transformation layer is needed between them.

mod cluster;
mod link;
mod note;
mod viewport;

pub use cluster::Cluster;
pub use link::{ArrowDirection, Link, LinkShape, LinkStyle, LinkType, LinkUpdate};
pub use note::{Note, NoteDraft, NoteType, NoteUpdate, ValidationError};
pub use viewport::Viewport;

/// Current wall-clock time as milliseconds since the Unix epoch.
///
/// All entity `created`/`modified` timestamps use this representation;
/// last-writer-wins merging compares these values directly.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
