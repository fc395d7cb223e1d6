//! Note Data Structures
//!
//! This module defines the `Note` struct plus its creation draft and
//! constrained update DTO.
//!
//! # Derived fields
//!
//! `references` is a derived cache of the note IDs resolvable from
//! `[[Title]]` occurrences in `content` at last save. It is deliberately
//! absent from [`NoteUpdate`]: callers can never set it directly, only the
//! reference resolver inside `CanvasService::update_note` recomputes it.
//! This prevents content and reference list from ever diverging.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::now_millis;

/// Validation errors for entity operations
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}

/// Classification of a note in the zettelkasten workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    /// Quick capture, to be processed later.
    Fleeting,
    /// Notes taken from a source (book, paper, article).
    Literature,
    /// Processed, standalone ideas in the user's own words.
    Permanent,
    /// Structural entry point linking out to a topic's notes.
    Hub,
}

impl Default for NoteType {
    fn default() -> Self {
        NoteType::Fleeting
    }
}

/// An atomic unit of content placed on the infinite canvas.
///
/// # Fields
///
/// - `id`: Unique identifier (UUID v4 string)
/// - `x`, `y`: World-space coordinates (canvas units, not pixels)
/// - `content`: Rich text / HTML body; `[[Title]]` spans are wiki references
/// - `references`: Derived cache of resolved outgoing references (see module docs)
/// - `cluster_id`: Weak reference to the containing cluster, if any
/// - `created`, `modified`: Millisecond epoch timestamps; `modified` drives
///   last-writer-wins merging against the remote copy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier (UUID v4 string)
    pub id: String,

    /// Note classification (fleeting/literature/permanent/hub)
    #[serde(rename = "type")]
    pub note_type: NoteType,

    /// World-space X coordinate
    pub x: f64,

    /// World-space Y coordinate
    pub y: f64,

    /// Display title; resolution target for `[[Title]]` references
    pub title: String,

    /// Rich text / HTML body
    pub content: String,

    /// Tags (order irrelevant, duplicates not meaningful)
    #[serde(default)]
    pub tags: Vec<String>,

    /// Containing cluster, if any (weak reference)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,

    /// Creation timestamp (ms epoch)
    pub created: i64,

    /// Last modification timestamp (ms epoch)
    pub modified: i64,

    /// IDs of notes this note's content references, in first-occurrence
    /// order. Derived from `content`; never set by callers.
    #[serde(default)]
    pub references: Vec<String>,

    /// Free-form source citation record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    /// Free-form per-source citation records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_metadata: Option<serde_json::Value>,
}

impl Note {
    /// Create a note from a draft, assigning a fresh ID and timestamps.
    pub fn from_draft(draft: NoteDraft) -> Self {
        let now = now_millis();
        Self {
            id: Uuid::new_v4().to_string(),
            note_type: draft.note_type,
            x: draft.x,
            y: draft.y,
            title: draft.title,
            content: draft.content,
            tags: draft.tags,
            cluster_id: draft.cluster_id,
            created: now,
            modified: now,
            references: Vec::new(),
            metadata: draft.metadata,
            sources_metadata: draft.sources_metadata,
        }
    }

    /// Validate structural requirements.
    ///
    /// Content and title may be empty - blank notes are valid while the
    /// user is still typing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }
        if self.references.iter().any(|r| r == &self.id) {
            return Err(ValidationError::InvalidReference(
                "note cannot reference itself".to_string(),
            ));
        }
        Ok(())
    }
}

/// Creation payload for [`Note`]: everything the user supplies, nothing
/// the store derives (id, timestamps, references).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    #[serde(rename = "type", default)]
    pub note_type: NoteType,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cluster_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub sources_metadata: Option<serde_json::Value>,
}

/// Sparse update for [`Note`]. Only present fields are applied.
///
/// There is intentionally no `references` field here (see module docs), no
/// timestamp fields - `modified` is bumped by the store on every apply -
/// and no `cluster_id`: membership moves through the cluster actions,
/// which keep the note's `cluster_id` and the cluster's `children` in
/// step. A `clusterId` key in incoming JSON is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdate {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub note_type: Option<NoteType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_metadata: Option<serde_json::Value>,
}

impl NoteUpdate {
    /// Convenience builder for the common content-edit path.
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Convenience builder for a title change.
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// True when no field is set; applying an empty update is a no-op
    /// apart from the `modified` bump the store performs.
    pub fn is_empty(&self) -> bool {
        self.note_type.is_none()
            && self.x.is_none()
            && self.y.is_none()
            && self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.metadata.is_none()
            && self.sources_metadata.is_none()
    }

    /// Merge this update into `note` field by field.
    ///
    /// Returns `true` when the content actually changed, which is the
    /// trigger for reference re-parsing and link reconciliation.
    pub fn apply_to(self, note: &mut Note) -> bool {
        let mut content_changed = false;

        if let Some(note_type) = self.note_type {
            note.note_type = note_type;
        }
        if let Some(x) = self.x {
            note.x = x;
        }
        if let Some(y) = self.y {
            note.y = y;
        }
        if let Some(title) = self.title {
            note.title = title;
        }
        if let Some(content) = self.content {
            if note.content != content {
                content_changed = true;
            }
            note.content = content;
        }
        if let Some(tags) = self.tags {
            note.tags = tags;
        }
        if let Some(metadata) = self.metadata {
            note.metadata = Some(metadata);
        }
        if let Some(sources_metadata) = self.sources_metadata {
            note.sources_metadata = Some(sources_metadata);
        }

        content_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> NoteDraft {
        NoteDraft {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn from_draft_assigns_id_and_timestamps() {
        let note = Note::from_draft(draft("Apple"));
        assert!(!note.id.is_empty());
        assert_eq!(note.created, note.modified);
        assert!(note.references.is_empty());
        assert!(note.validate().is_ok());
    }

    #[test]
    fn update_apply_reports_content_change() {
        let mut note = Note::from_draft(draft("Apple"));
        assert!(!NoteUpdate::title("Apfel").apply_to(&mut note));
        assert_eq!(note.title, "Apfel");

        assert!(NoteUpdate::content("hello").apply_to(&mut note));
        // Same content again is not a change
        assert!(!NoteUpdate::content("hello").apply_to(&mut note));
    }

    #[test]
    fn update_cannot_reassign_cluster_membership() {
        let mut note = Note::from_draft(draft("Apple"));
        note.cluster_id = Some("cluster-1".to_string());

        // A clusterId key in incoming JSON is dropped, not applied
        let update: NoteUpdate = serde_json::from_value(serde_json::json!({
            "clusterId": "cluster-2",
            "title": "Apfel"
        }))
        .unwrap();
        update.apply_to(&mut note);

        assert_eq!(note.cluster_id.as_deref(), Some("cluster-1"));
        assert_eq!(note.title, "Apfel");
    }

    #[test]
    fn note_serializes_camel_case() {
        let mut note = Note::from_draft(draft("Apple"));
        note.cluster_id = Some("c1".to_string());
        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["type"], "fleeting");
        assert!(value.get("clusterId").is_some());
        assert!(value.get("cluster_id").is_none());
    }
}
