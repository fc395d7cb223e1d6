//! Cluster model: a named, colored grouping of notes.
//!
//! # Invariants (maintained by `CanvasService`)
//!
//! - `x`/`y` equal the arithmetic mean of the children's positions after
//!   any membership change or committed child move. The one exception is
//!   an explicit cluster reposition, which translates the children by the
//!   same delta and therefore re-establishes the centroid by construction.
//! - Every ID in `children` belongs to a note whose `cluster_id` points
//!   back here, and no note appears in two clusters.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::now_millis;

/// A grouping of notes rendered as a single area on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Unique identifier (UUID v4 string)
    pub id: String,

    /// Display title
    pub title: String,

    /// Centroid X (mean of children, see module docs)
    pub x: f64,

    /// Centroid Y
    pub y: f64,

    /// Member note IDs. Ordered, but with set semantics - no duplicates.
    #[serde(default)]
    pub children: Vec<String>,

    /// Display color (CSS color string)
    pub color: String,

    /// Last modification timestamp (ms epoch)
    pub modified: i64,
}

impl Cluster {
    /// Create a cluster with the given members and a precomputed centroid.
    pub fn new(title: impl Into<String>, children: Vec<String>, color: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            x: 0.0,
            y: 0.0,
            children,
            color: color.into(),
            modified: now_millis(),
        }
    }

    /// Add a member, preserving set semantics.
    pub fn add_child(&mut self, note_id: &str) {
        if !self.children.iter().any(|c| c == note_id) {
            self.children.push(note_id.to_string());
        }
    }

    /// Remove a member. Returns whether it was present.
    pub fn remove_child(&mut self, note_id: &str) -> bool {
        let before = self.children.len();
        self.children.retain(|c| c != note_id);
        self.children.len() != before
    }
}
