//! Remote snapshot merge policy.
//!
//! Notes merge per-entity by `modified` timestamp: the remote copy wins
//! when `remote.modified >= local.modified` (last-writer-wins, remote
//! priority on exact ties). Snapshot membership is authoritative - a
//! note absent from the remote snapshot is dropped locally, which is
//! what makes an intentionally emptied remote account propagate as an
//! empty canvas rather than resurrecting stale data.
//!
//! Clusters and links are not timestamp-merged: their snapshots replace
//! the in-memory collection wholesale. Their churn is low-frequency and
//! rarely concurrently edited, so the simpler policy is acceptable.

use std::collections::HashMap;

use crate::models::Note;

use super::gateway::NotesSnapshot;

/// Result of merging a remote notes snapshot into local state.
#[derive(Debug, Default)]
pub struct NoteMergeOutcome {
    /// The merged collection that becomes the new in-memory state.
    pub merged: HashMap<String, Note>,
    /// Local note IDs that were dropped because the snapshot no longer
    /// contains them.
    pub dropped: Vec<String>,
}

/// Merge an incoming full-collection notes snapshot against local state.
pub fn merge_remote_notes(
    local: &HashMap<String, Note>,
    remote: NotesSnapshot,
) -> NoteMergeOutcome {
    let mut outcome = NoteMergeOutcome::default();

    for (id, remote_note) in remote {
        match local.get(&id) {
            Some(local_note) if local_note.modified > remote_note.modified => {
                outcome.merged.insert(id, local_note.clone());
            }
            _ => {
                outcome.merged.insert(id, remote_note);
            }
        }
    }

    for id in local.keys() {
        if !outcome.merged.contains_key(id) {
            outcome.dropped.push(id.clone());
        }
    }

    outcome
}
