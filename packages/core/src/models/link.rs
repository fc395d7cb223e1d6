//! Link model: a bidirectional connection between two notes.
//!
//! Links are undirected for reference purposes - at most one link exists
//! per unordered `{source, target}` pair, and a link exists exactly when
//! both notes carry each other in their `references`. Direction-sensitive
//! display metadata (`arrow_direction`) is user-editable on top of that.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::now_millis;

/// Semantic relationship encoded by a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Related,
    Parent,
    Criticism,
}

/// Stroke style for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStyle {
    Solid,
    Dashed,
    Dotted,
}

/// Path shape for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkShape {
    Curved,
    Straight,
}

/// Arrowhead placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowDirection {
    Forward,
    Reverse,
    None,
}

/// An explicit or content-derived connection between two notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Unique identifier (UUID v4 string)
    pub id: String,

    /// One endpoint. Source/target order carries no reference semantics.
    pub source_id: String,

    /// The other endpoint.
    pub target_id: String,

    /// Optional semantic relationship
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<LinkType>,

    /// Optional display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Optional display color (CSS color string)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Stroke style
    pub style: LinkStyle,

    /// Path shape
    pub shape: LinkShape,

    /// Arrowhead placement
    pub arrow_direction: ArrowDirection,

    /// Last modification timestamp (ms epoch)
    pub modified: i64,
}

impl Link {
    /// Create a link with default display metadata (solid curved, no arrow).
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            link_type: None,
            label: None,
            color: None,
            style: LinkStyle::Solid,
            shape: LinkShape::Curved,
            arrow_direction: ArrowDirection::None,
            modified: now_millis(),
        }
    }

    /// True when this link connects the unordered pair `{a, b}`.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source_id == a && self.target_id == b)
            || (self.source_id == b && self.target_id == a)
    }

    /// True when either endpoint is `note_id`.
    pub fn touches(&self, note_id: &str) -> bool {
        self.source_id == note_id || self.target_id == note_id
    }

    /// The endpoint opposite `note_id`, or `None` when the link does not
    /// touch that note.
    pub fn other_end(&self, note_id: &str) -> Option<&str> {
        if self.source_id == note_id {
            Some(&self.target_id)
        } else if self.target_id == note_id {
            Some(&self.source_id)
        } else {
            None
        }
    }
}

/// Sparse update for [`Link`] display metadata.
///
/// Endpoints (`source_id`/`target_id`) are intentionally not updatable:
/// retargeting a link would have to rewrite both notes' reference arrays,
/// which only the reconciliation paths are allowed to do.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkUpdate {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<LinkType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<LinkStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<LinkShape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrow_direction: Option<ArrowDirection>,
}

impl LinkUpdate {
    /// Merge into `link`, leaving endpoints untouched.
    pub fn apply_to(self, link: &mut Link) {
        if let Some(link_type) = self.link_type {
            link.link_type = Some(link_type);
        }
        if let Some(label) = self.label {
            link.label = Some(label);
        }
        if let Some(color) = self.color {
            link.color = Some(color);
        }
        if let Some(style) = self.style {
            link.style = style;
        }
        if let Some(shape) = self.shape {
            link.shape = shape;
        }
        if let Some(arrow_direction) = self.arrow_direction {
            link.arrow_direction = arrow_direction;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connects_is_unordered() {
        let link = Link::new("a", "b");
        assert!(link.connects("a", "b"));
        assert!(link.connects("b", "a"));
        assert!(!link.connects("a", "c"));
    }

    #[test]
    fn other_end_resolves_both_directions() {
        let link = Link::new("a", "b");
        assert_eq!(link.other_end("a"), Some("b"));
        assert_eq!(link.other_end("b"), Some("a"));
        assert_eq!(link.other_end("c"), None);
    }

    #[test]
    fn update_never_touches_endpoints() {
        let mut link = Link::new("a", "b");
        LinkUpdate {
            style: Some(LinkStyle::Dashed),
            arrow_direction: Some(ArrowDirection::Forward),
            ..Default::default()
        }
        .apply_to(&mut link);

        assert_eq!(link.style, LinkStyle::Dashed);
        assert_eq!(link.arrow_direction, ArrowDirection::Forward);
        assert_eq!(link.source_id, "a");
        assert_eq!(link.target_id, "b");
    }
}
