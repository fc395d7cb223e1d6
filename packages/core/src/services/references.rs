//! Reference Resolver
//!
//! Pure functions that extract `[[Title]]` wiki references from note
//! content and resolve them against a snapshot of the note map. No side
//! effects; the store applies the results.
//!
//! Resolution is by case-insensitive exact match on the trimmed captured
//! title. A title that is a substring of another title never matches
//! partially. Duplicate titles resolve to whichever note the map yields
//! first - nondeterminism-by-order inherited from the product, not a
//! contract to rely on.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::models::Note;

/// Non-greedy `[[...]]` capture; brackets cannot nest.
const REFERENCE_PATTERN: &str = r"\[\[([^\[\]]+?)\]\]";

fn reference_regex() -> &'static Regex {
    static REFERENCE_REGEX: OnceLock<Regex> = OnceLock::new();
    REFERENCE_REGEX.get_or_init(|| Regex::new(REFERENCE_PATTERN).unwrap())
}

/// A classified span of note content, for rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    /// Literal text between references.
    Text { text: String },
    /// A `[[Title]]` occurrence. `note_id` is `Some` and `resolved` true
    /// when the title matched a note; unresolved references are still
    /// emitted so the consumer can render them as broken.
    Reference {
        text: String,
        note_id: Option<String>,
        resolved: bool,
    },
}

fn resolve_title<'a>(title: &str, notes: &'a HashMap<String, Note>) -> Option<&'a Note> {
    let wanted = title.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    notes
        .values()
        .find(|note| note.title.trim().to_lowercase() == wanted)
}

/// Extract the note IDs referenced by `content`, in first-occurrence
/// order, de-duplicated by ID. Unresolved titles are dropped silently.
pub fn parse_references(content: &str, notes: &HashMap<String, Note>) -> Vec<String> {
    let mut references = Vec::new();
    for cap in reference_regex().captures_iter(content) {
        if let Some(title) = cap.get(1) {
            if let Some(note) = resolve_title(title.as_str(), notes) {
                if !references.iter().any(|id| id == &note.id) {
                    references.push(note.id.clone());
                }
            }
        }
    }
    references
}

/// Split `content` into literal-text and reference spans for rendering.
///
/// Literal runs between matches are preserved exactly; empty content
/// yields an empty sequence.
pub fn parse_content_parts(content: &str, notes: &HashMap<String, Note>) -> Vec<ContentPart> {
    let mut parts = Vec::new();
    let mut cursor = 0;

    for cap in reference_regex().captures_iter(content) {
        let (Some(whole), Some(title)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let title = title.as_str().trim();

        if whole.start() > cursor {
            parts.push(ContentPart::Text {
                text: content[cursor..whole.start()].to_string(),
            });
        }

        let resolved = resolve_title(title, notes);
        parts.push(ContentPart::Reference {
            text: title.to_string(),
            note_id: resolved.map(|note| note.id.clone()),
            resolved: resolved.is_some(),
        });

        cursor = whole.end();
    }

    if cursor < content.len() {
        parts.push(ContentPart::Text {
            text: content[cursor..].to_string(),
        });
    }

    parts
}

/// Every note whose `references` contains `note_id`.
///
/// Linear scan; fine at the thousands-of-notes scale this store targets.
pub fn get_backlinks<'a>(note_id: &str, notes: &'a HashMap<String, Note>) -> Vec<&'a Note> {
    notes
        .values()
        .filter(|note| note.references.iter().any(|id| id == note_id))
        .collect()
}
