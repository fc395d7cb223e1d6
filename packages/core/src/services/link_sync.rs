//! Bidirectional Link Synchronizer
//!
//! Reconciles a note's parsed reference list against the existing link
//! set. Pure: computes the diff as data, the store applies it. Invoked
//! from the content-update path; the explicit "link two notes" gesture
//! goes through `CanvasService::add_link` instead, and both converge on
//! the same invariant: a link between A and B exists iff A and B
//! reference each other.

use std::collections::HashMap;

use crate::models::Link;

/// Link mutations required to bring the link set in line with a note's
/// new reference list.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LinkDiff {
    /// Links to insert (fresh default-styled links).
    pub to_create: Vec<Link>,
    /// IDs of links to remove.
    pub to_delete: Vec<String>,
}

impl LinkDiff {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

/// Find the link connecting the unordered pair `{a, b}`, if any.
pub fn find_link_between<'a>(
    a: &str,
    b: &str,
    links: &'a HashMap<String, Link>,
) -> Option<&'a Link> {
    links.values().find(|link| link.connects(a, b))
}

/// Compute the link mutations for a note whose references changed from
/// `old_references` to `new_references`.
///
/// Idempotent: running the same before/after pair twice produces an empty
/// diff the second time (assuming the first diff was applied). Self-pairs
/// are skipped; targets that no longer exist are the caller's concern -
/// note deletion already strips dangling references.
pub fn reconcile_references(
    note_id: &str,
    new_references: &[String],
    old_references: &[String],
    links: &HashMap<String, Link>,
) -> LinkDiff {
    let mut diff = LinkDiff::default();

    for added in new_references
        .iter()
        .filter(|id| !old_references.contains(id))
    {
        if added == note_id {
            continue;
        }
        if find_link_between(note_id, added, links).is_none() {
            diff.to_create.push(Link::new(note_id, added.clone()));
        }
    }

    for removed in old_references
        .iter()
        .filter(|id| !new_references.contains(id))
    {
        if let Some(link) = find_link_between(note_id, removed, links) {
            diff.to_delete.push(link.id.clone());
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links_map(links: Vec<Link>) -> HashMap<String, Link> {
        links.into_iter().map(|l| (l.id.clone(), l)).collect()
    }

    #[test]
    fn creates_links_for_added_references() {
        let diff = reconcile_references("a", &["b".to_string()], &[], &HashMap::new());
        assert_eq!(diff.to_create.len(), 1);
        assert!(diff.to_create[0].connects("a", "b"));
        assert!(diff.to_delete.is_empty());
    }

    #[test]
    fn deletes_links_for_removed_references() {
        let link = Link::new("a", "b");
        let link_id = link.id.clone();
        let links = links_map(vec![link]);

        let diff = reconcile_references("a", &[], &["b".to_string()], &links);
        assert!(diff.to_create.is_empty());
        assert_eq!(diff.to_delete, vec![link_id]);
    }

    #[test]
    fn existing_link_is_not_duplicated() {
        let links = links_map(vec![Link::new("b", "a")]);
        // Reversed endpoints still count - pairs are unordered
        let diff = reconcile_references("a", &["b".to_string()], &[], &links);
        assert!(diff.is_empty());
    }

    #[test]
    fn reconcile_is_idempotent() {
        let new_refs = vec!["b".to_string()];
        let old_refs = vec!["c".to_string()];
        let c_link = Link::new("a", "c");
        let mut links = links_map(vec![c_link]);

        let first = reconcile_references("a", &new_refs, &old_refs, &links);
        assert_eq!(first.to_create.len(), 1);
        assert_eq!(first.to_delete.len(), 1);

        // Apply the diff, then reconcile again with identical inputs
        for link in &first.to_create {
            links.insert(link.id.clone(), link.clone());
        }
        for id in &first.to_delete {
            links.remove(id);
        }

        let second = reconcile_references("a", &new_refs, &new_refs, &links);
        assert!(second.is_empty());
    }

    #[test]
    fn self_references_are_skipped() {
        let diff = reconcile_references("a", &["a".to_string()], &[], &HashMap::new());
        assert!(diff.is_empty());
    }

    #[test]
    fn removing_reference_without_link_is_a_noop() {
        let diff = reconcile_references("a", &[], &["ghost".to_string()], &HashMap::new());
        assert!(diff.is_empty());
    }
}
