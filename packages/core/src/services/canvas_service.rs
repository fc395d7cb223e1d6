//! CanvasService - the reactive domain store.
//!
//! Single process-wide owner of the canonical in-memory note, cluster and
//! link maps plus the transient UI state (selection, viewport, editing
//! target, in-progress drag). Every mutation goes through an action on
//! this type; the rendering layer reads state and invokes actions but
//! never touches the maps directly.
//!
//! # Mutation contract
//!
//! Actions are synchronous against the in-memory maps - the optimistic
//! state is visible to the caller the moment an action returns. Durable
//! persistence and remote mirroring are dispatched afterwards as
//! fire-and-forget tasks, each wrapped in its own error boundary that
//! logs and swallows failures. The in-memory copy stays authoritative
//! for the session regardless of mirror outcomes; a lost remote write is
//! simply stale until the next edit or an explicit `force_push_all`.
//!
//! # Invariants owned here
//!
//! - A link between A and B exists exactly when A and B reference each other
//! - Cluster centroid = mean of children positions (except right after an
//!   explicit cluster reposition, which moves the children instead)
//! - Deleting a note leaves no dangling link or reference behind
//! - `references` is only ever recomputed from content, never set

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::db::LocalStore;
use crate::models::{
    now_millis, Cluster, Link, LinkUpdate, Note, NoteDraft, NoteUpdate, Viewport,
};
use crate::sync::{merge, ClustersSnapshot, LinksSnapshot, NotesSnapshot, RemoteGateway};

use super::error::{CanvasServiceError, ImportError};
use super::events::DomainEvent;
use super::link_sync;
use super::references;
use super::spatial;

const DOMAIN_EVENT_CHANNEL_CAPACITY: usize = 128;
const EXPORT_VERSION: u32 = 1;

fn default_export_version() -> u32 {
    EXPORT_VERSION
}

/// Serialized backup: the three entity maps exactly as held in memory,
/// plus a version tag and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    #[serde(default = "default_export_version")]
    pub version: u32,
    #[serde(default)]
    pub export_date: String,
    pub data: ExportPayload,
}

/// Entity maps keyed by ID, matching the in-memory representation
/// exactly (no transformation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportPayload {
    pub notes: HashMap<String, Note>,
    #[serde(default)]
    pub clusters: HashMap<String, Cluster>,
    #[serde(default)]
    pub links: HashMap<String, Link>,
}

/// What an import replaced, reported back to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub notes: usize,
    pub clusters: usize,
    pub links: usize,
}

/// Outcome of a manual full push to the remote store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushSummary {
    pub attempted: usize,
    pub failed: usize,
}

/// State of an in-progress group drag.
struct DragState {
    anchor_start: (f64, f64),
    /// Start position of every dragged note, anchor included.
    starts: HashMap<String, (f64, f64)>,
}

/// The reactive domain store. One instance per process, constructed at
/// startup and injected into consumers.
pub struct CanvasService {
    notes: HashMap<String, Note>,
    clusters: HashMap<String, Cluster>,
    links: HashMap<String, Link>,

    selection: HashSet<String>,
    viewport: Viewport,
    editing: Option<String>,
    drag: Option<DragState>,

    store: Arc<dyn LocalStore>,
    gateway: Option<Arc<dyn RemoteGateway>>,
    event_tx: broadcast::Sender<DomainEvent>,
}

impl CanvasService {
    /// Create an empty service over a local store.
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        let (event_tx, _) = broadcast::channel(DOMAIN_EVENT_CHANNEL_CAPACITY);
        Self {
            notes: HashMap::new(),
            clusters: HashMap::new(),
            links: HashMap::new(),
            selection: HashSet::new(),
            viewport: Viewport::default(),
            editing: None,
            drag: None,
            store,
            gateway: None,
            event_tx,
        }
    }

    /// Create a service hydrated from the local store's persisted state.
    pub async fn load(store: Arc<dyn LocalStore>) -> Result<Self, CanvasServiceError> {
        let notes = store
            .all_notes()
            .await
            .map_err(CanvasServiceError::StateLoadFailed)?;
        let clusters = store
            .all_clusters()
            .await
            .map_err(CanvasServiceError::StateLoadFailed)?;
        let links = store
            .all_links()
            .await
            .map_err(CanvasServiceError::StateLoadFailed)?;

        let mut service = Self::new(store);
        service.notes = notes;
        service.clusters = clusters;
        service.links = links;
        info!(
            notes = service.notes.len(),
            clusters = service.clusters.len(),
            links = service.links.len(),
            "Loaded persisted canvas state"
        );
        Ok(service)
    }

    /// Attach a remote gateway. Until one is attached all remote
    /// mirroring is silently skipped.
    pub fn set_gateway(&mut self, gateway: Arc<dyn RemoteGateway>) {
        self.gateway = Some(gateway);
    }

    /// Subscribe to domain events.
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: DomainEvent) {
        // Ignores errors if no subscribers (expected in some tests)
        let _ = self.event_tx.send(event);
    }

    //
    // READ ACCESS
    //

    pub fn notes(&self) -> &HashMap<String, Note> {
        &self.notes
    }

    pub fn clusters(&self) -> &HashMap<String, Cluster> {
        &self.clusters
    }

    pub fn links(&self) -> &HashMap<String, Link> {
        &self.links
    }

    pub fn get_note(&self, id: &str) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn get_cluster(&self, id: &str) -> Option<&Cluster> {
        self.clusters.get(id)
    }

    pub fn get_link(&self, id: &str) -> Option<&Link> {
        self.links.get(id)
    }

    pub fn selection(&self) -> &HashSet<String> {
        &self.selection
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Notes whose content references `note_id`.
    pub fn backlinks(&self, note_id: &str) -> Vec<&Note> {
        references::get_backlinks(note_id, &self.notes)
    }

    /// Classified content spans of a note, for rendering.
    pub fn content_parts(&self, note_id: &str) -> Vec<references::ContentPart> {
        match self.notes.get(note_id) {
            Some(note) => references::parse_content_parts(&note.content, &self.notes),
            None => Vec::new(),
        }
    }

    //
    // NOTE ACTIONS
    //

    /// Create a note from a draft. The note is visible in the map before
    /// durable persistence completes, and becomes the editing target.
    ///
    /// Remote sync is intentionally not attempted here; notes reach the
    /// remote store via higher-level flows (link/cluster cascades,
    /// content updates, full pushes).
    pub fn add_note(&mut self, draft: NoteDraft) -> String {
        let note = Note::from_draft(draft);
        let id = note.id.clone();
        self.notes.insert(id.clone(), note.clone());
        self.editing = Some(id.clone());

        self.emit(DomainEvent::NoteCreated(note.clone()));
        self.persist_note(&note);
        id
    }

    /// Merge a sparse update into a note. Unknown IDs are ignored.
    ///
    /// When the content changed, references are recomputed from the new
    /// content and the link set is reconciled so that link existence and
    /// mutual references stay in lockstep. The persisted note always
    /// carries the recomputed references, never caller-supplied ones.
    pub fn update_note(&mut self, id: &str, update: NoteUpdate) {
        let Some(mut note) = self.notes.get(id).cloned() else {
            debug!("update_note: unknown note {id}, ignoring");
            return;
        };

        let content_changed = update.apply_to(&mut note);
        note.modified = now_millis();

        let mut changed_neighbors: Vec<String> = Vec::new();
        let mut created_links: Vec<Link> = Vec::new();
        let mut deleted_links: Vec<Link> = Vec::new();

        if content_changed {
            let old_references = note.references.clone();
            let mut new_references = references::parse_references(&note.content, &self.notes);
            // A note may mention its own title; that never becomes a link
            new_references.retain(|r| r != id);

            let diff =
                link_sync::reconcile_references(id, &new_references, &old_references, &self.links);
            note.references = new_references;

            for link in diff.to_create {
                let Some(other_id) = link.other_end(id).map(str::to_string) else {
                    continue;
                };
                let Some(other) = self.notes.get_mut(&other_id) else {
                    debug!("update_note: reference target {other_id} gone, skipping link");
                    continue;
                };
                if !other.references.iter().any(|r| r == id) {
                    other.references.push(id.to_string());
                    other.modified = now_millis();
                }
                if !changed_neighbors.contains(&other_id) {
                    changed_neighbors.push(other_id);
                }
                self.links.insert(link.id.clone(), link.clone());
                created_links.push(link);
            }

            for link_id in diff.to_delete {
                if let Some(link) = self.links.remove(&link_id) {
                    if let Some(other_id) = link.other_end(id).map(str::to_string) {
                        if let Some(other) = self.notes.get_mut(&other_id) {
                            let before = other.references.len();
                            other.references.retain(|r| r != id);
                            if other.references.len() != before {
                                other.modified = now_millis();
                                if !changed_neighbors.contains(&other_id) {
                                    changed_neighbors.push(other_id);
                                }
                            }
                        }
                    }
                    deleted_links.push(link);
                }
            }
        }

        self.notes.insert(id.to_string(), note.clone());

        for link in &created_links {
            self.emit(DomainEvent::LinkCreated(link.clone()));
            self.persist_link(link);
            self.remote_sync_link(link);
        }
        for link in &deleted_links {
            self.emit(DomainEvent::LinkDeleted {
                id: link.id.clone(),
            });
            self.persist_delete_link(&link.id);
            self.remote_delete_link(&link.id);
        }

        self.emit(DomainEvent::NoteUpdated(note.clone()));
        self.persist_note(&note);
        self.remote_sync_note(&note);

        for neighbor_id in changed_neighbors {
            if let Some(neighbor) = self.notes.get(&neighbor_id).cloned() {
                self.emit(DomainEvent::NoteUpdated(neighbor.clone()));
                self.persist_note(&neighbor);
                self.remote_sync_note(&neighbor);
            }
        }
    }

    /// Delete a note and cascade: cluster membership, touching links,
    /// and every other note's reference to it. The in-memory cascade is
    /// one synchronous batch; the durable and remote mirrors follow in
    /// the same order, each failure logged independently.
    pub fn delete_note(&mut self, id: &str) {
        let Some(note) = self.notes.remove(id) else {
            debug!("delete_note: unknown note {id}, ignoring");
            return;
        };

        self.selection.remove(id);
        if self.editing.as_deref() == Some(id) {
            self.editing = None;
        }

        // 1. Cluster membership
        let mut touched_cluster: Option<String> = None;
        if let Some(cluster_id) = &note.cluster_id {
            if let Some(cluster) = self.clusters.get_mut(cluster_id) {
                if cluster.remove_child(id) {
                    cluster.modified = now_millis();
                    touched_cluster = Some(cluster_id.clone());
                }
            }
        }
        if let Some(cluster_id) = &touched_cluster {
            // Empty clusters persist as stubs at their last position
            self.refresh_centroid(cluster_id);
        }

        // 2. Touching links
        let link_ids: Vec<String> = self
            .links
            .values()
            .filter(|l| l.touches(id))
            .map(|l| l.id.clone())
            .collect();
        for link_id in &link_ids {
            self.links.remove(link_id);
        }

        // 3. Dangling references
        let mut touched_notes: Vec<Note> = Vec::new();
        for other in self.notes.values_mut() {
            let before = other.references.len();
            other.references.retain(|r| r != id);
            if other.references.len() != before {
                other.modified = now_millis();
                touched_notes.push(other.clone());
            }
        }

        // Mirrors, in cascade order
        if let Some(cluster_id) = touched_cluster {
            if let Some(cluster) = self.clusters.get(&cluster_id).cloned() {
                self.emit(DomainEvent::ClusterUpdated(cluster.clone()));
                self.persist_cluster(&cluster);
                self.remote_sync_cluster(&cluster);
            }
        }
        for link_id in &link_ids {
            self.emit(DomainEvent::LinkDeleted {
                id: link_id.clone(),
            });
            self.persist_delete_link(link_id);
            self.remote_delete_link(link_id);
        }
        for touched in &touched_notes {
            self.emit(DomainEvent::NoteUpdated(touched.clone()));
            self.persist_note(touched);
            self.remote_sync_note(touched);
        }

        self.emit(DomainEvent::NoteDeleted { id: id.to_string() });
        self.persist_delete_note(id);
        self.remote_delete_note(id);
    }

    //
    // POSITION / DRAG ACTIONS
    //

    /// Single-note position commit: assign, bump `modified`, persist,
    /// and recompute the containing cluster's centroid synchronously.
    pub fn update_note_position(&mut self, id: &str, x: f64, y: f64) {
        let Some(note) = self.notes.get_mut(id) else {
            debug!("update_note_position: unknown note {id}, ignoring");
            return;
        };
        note.x = x;
        note.y = y;
        note.modified = now_millis();
        let cluster_id = note.cluster_id.clone();
        let note = note.clone();

        self.emit(DomainEvent::NoteUpdated(note.clone()));
        self.persist_note(&note);
        self.remote_sync_note(&note);

        if let Some(cluster_id) = cluster_id {
            self.commit_centroid(&cluster_id);
        }
    }

    /// Start a drag anchored at `anchor_id`. When the anchor is part of
    /// the current selection the whole selection is dragged as a group;
    /// otherwise only the anchor moves.
    pub fn begin_drag(&mut self, anchor_id: &str) {
        let Some(anchor) = self.notes.get(anchor_id) else {
            debug!("begin_drag: unknown note {anchor_id}, ignoring");
            return;
        };
        let anchor_start = (anchor.x, anchor.y);

        let group: Vec<&str> = if self.selection.contains(anchor_id) {
            self.selection.iter().map(String::as_str).collect()
        } else {
            vec![anchor_id]
        };
        let starts = group
            .into_iter()
            .filter_map(|id| self.notes.get(id).map(|n| (id.to_string(), (n.x, n.y))))
            .collect();

        self.drag = Some(DragState {
            anchor_start,
            starts,
        });
    }

    /// Transient drag frame: translate every dragged note by the anchor
    /// delta. In-memory only - no persistence, no remote sync - so the
    /// write volume stays bounded to once per drag, not once per frame.
    /// Cluster centroids are recomputed in memory for live preview.
    pub fn drag_to(&mut self, x: f64, y: f64) {
        let Some(drag) = &self.drag else {
            return;
        };
        let (dx, dy) = spatial::drag_delta(drag.anchor_start, (x, y));
        let moves: Vec<(String, f64, f64)> = drag
            .starts
            .iter()
            .map(|(id, (sx, sy))| (id.clone(), sx + dx, sy + dy))
            .collect();

        let mut affected_clusters = HashSet::new();
        for (id, nx, ny) in moves {
            if let Some(note) = self.notes.get_mut(&id) {
                note.x = nx;
                note.y = ny;
                if let Some(cluster_id) = &note.cluster_id {
                    affected_clusters.insert(cluster_id.clone());
                }
            }
        }
        for cluster_id in affected_clusters {
            self.refresh_centroid(&cluster_id);
        }
    }

    /// Commit the drag at the final pointer position: same translation
    /// as the transient path, plus `modified` bumps, persistence, remote
    /// sync and a persisted centroid recompute per affected cluster.
    pub fn end_drag(&mut self, x: f64, y: f64) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let (dx, dy) = spatial::drag_delta(drag.anchor_start, (x, y));

        let mut affected_clusters = HashSet::new();
        let mut moved: Vec<Note> = Vec::new();
        for (id, (sx, sy)) in &drag.starts {
            if let Some(note) = self.notes.get_mut(id) {
                note.x = sx + dx;
                note.y = sy + dy;
                note.modified = now_millis();
                if let Some(cluster_id) = &note.cluster_id {
                    affected_clusters.insert(cluster_id.clone());
                }
                moved.push(note.clone());
            }
        }

        for note in &moved {
            self.emit(DomainEvent::NoteUpdated(note.clone()));
            self.persist_note(note);
            self.remote_sync_note(note);
        }
        for cluster_id in affected_clusters {
            self.commit_centroid(&cluster_id);
        }
    }

    //
    // SELECTION / VIEWPORT ACTIONS
    //

    /// Replace the selection. Unknown IDs are dropped.
    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = String>) {
        self.selection = ids
            .into_iter()
            .filter(|id| self.notes.contains_key(id))
            .collect();
    }

    /// Rubber-band selection: select every note inside the world-space
    /// rectangle spanned by any two opposite corners.
    pub fn select_in_rect(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.selection = spatial::notes_in_rect(&self.notes, x1, y1, x2, y2)
            .into_iter()
            .collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_editing(&mut self, note_id: Option<String>) {
        self.editing = note_id.filter(|id| self.notes.contains_key(id));
    }

    //
    // CLUSTER ACTIONS
    //

    /// Create a cluster from a non-empty selection of notes. Returns the
    /// cluster ID, or `None` when the member set resolves to nothing.
    /// Notes already in another cluster move over.
    pub fn create_cluster(
        &mut self,
        title: impl Into<String>,
        note_ids: &[String],
        color: impl Into<String>,
    ) -> Option<String> {
        // Set semantics: drop unknown IDs and duplicates, which would
        // otherwise double-count a note in the centroid
        let mut members: Vec<String> = Vec::new();
        for note_id in note_ids {
            if self.notes.contains_key(note_id) && !members.contains(note_id) {
                members.push(note_id.clone());
            }
        }
        if members.is_empty() {
            debug!("create_cluster: empty member set, ignoring");
            return None;
        }

        // Membership is exclusive: pull members out of any previous cluster
        for member_id in &members {
            self.detach_from_cluster(member_id);
        }

        let mut cluster = Cluster::new(title, members.clone(), color);
        let positions: Vec<(f64, f64)> = members
            .iter()
            .filter_map(|id| self.notes.get(id).map(|n| (n.x, n.y)))
            .collect();
        if let Some((cx, cy)) = spatial::centroid(&positions) {
            cluster.x = cx;
            cluster.y = cy;
        }
        let cluster_id = cluster.id.clone();

        let mut member_notes = Vec::new();
        for member_id in &members {
            if let Some(note) = self.notes.get_mut(member_id) {
                note.cluster_id = Some(cluster_id.clone());
                note.modified = now_millis();
                member_notes.push(note.clone());
            }
        }
        self.clusters.insert(cluster_id.clone(), cluster.clone());

        self.emit(DomainEvent::ClusterCreated(cluster.clone()));
        self.persist_cluster(&cluster);
        self.remote_sync_cluster(&cluster);
        for note in &member_notes {
            self.emit(DomainEvent::NoteUpdated(note.clone()));
            self.persist_note(note);
            self.remote_sync_note(note);
        }

        Some(cluster_id)
    }

    /// Delete a cluster. Its notes survive with `cluster_id` cleared.
    pub fn delete_cluster(&mut self, id: &str) {
        let Some(cluster) = self.clusters.remove(id) else {
            debug!("delete_cluster: unknown cluster {id}, ignoring");
            return;
        };

        let mut freed = Vec::new();
        for child_id in &cluster.children {
            if let Some(note) = self.notes.get_mut(child_id) {
                if note.cluster_id.as_deref() == Some(id) {
                    note.cluster_id = None;
                    note.modified = now_millis();
                    freed.push(note.clone());
                }
            }
        }

        for note in &freed {
            self.emit(DomainEvent::NoteUpdated(note.clone()));
            self.persist_note(note);
            self.remote_sync_note(note);
        }
        self.emit(DomainEvent::ClusterDeleted { id: id.to_string() });
        self.persist_delete_cluster(id);
        self.remote_delete_cluster(id);
    }

    /// Add a note to a cluster, moving it out of any previous cluster,
    /// then recompute the centroid.
    pub fn add_to_cluster(&mut self, cluster_id: &str, note_id: &str) {
        if !self.clusters.contains_key(cluster_id) || !self.notes.contains_key(note_id) {
            debug!("add_to_cluster: unknown cluster or note, ignoring");
            return;
        }
        self.detach_from_cluster(note_id);

        let mut updated_note = None;
        if let Some(cluster) = self.clusters.get_mut(cluster_id) {
            cluster.add_child(note_id);
            cluster.modified = now_millis();
        }
        if let Some(note) = self.notes.get_mut(note_id) {
            note.cluster_id = Some(cluster_id.to_string());
            note.modified = now_millis();
            updated_note = Some(note.clone());
        }

        if let Some(note) = updated_note {
            self.emit(DomainEvent::NoteUpdated(note.clone()));
            self.persist_note(&note);
            self.remote_sync_note(&note);
        }
        self.commit_centroid(cluster_id);
    }

    /// Remove a note from its cluster (if any), then recompute the
    /// centroid. An emptied cluster persists as a stub.
    pub fn remove_from_cluster(&mut self, note_id: &str) {
        let Some(cluster_id) = self
            .notes
            .get(note_id)
            .and_then(|n| n.cluster_id.clone())
        else {
            debug!("remove_from_cluster: note {note_id} not clustered, ignoring");
            return;
        };

        self.detach_from_cluster(note_id);
        if let Some(note) = self.notes.get(note_id).cloned() {
            self.emit(DomainEvent::NoteUpdated(note.clone()));
            self.persist_note(&note);
            self.remote_sync_note(&note);
        }
        self.commit_centroid(&cluster_id);
    }

    /// Explicitly reposition a cluster: children translate by the same
    /// delta, preserving relative layout, which re-establishes the
    /// centroid invariant by construction.
    pub fn update_cluster_position(&mut self, id: &str, x: f64, y: f64) {
        let Some(cluster) = self.clusters.get_mut(id) else {
            debug!("update_cluster_position: unknown cluster {id}, ignoring");
            return;
        };
        let (dx, dy) = (x - cluster.x, y - cluster.y);
        cluster.x = x;
        cluster.y = y;
        cluster.modified = now_millis();
        let children = cluster.children.clone();
        let cluster = cluster.clone();

        let mut moved = Vec::new();
        for child_id in &children {
            if let Some(note) = self.notes.get_mut(child_id) {
                note.x += dx;
                note.y += dy;
                note.modified = now_millis();
                moved.push(note.clone());
            }
        }

        self.emit(DomainEvent::ClusterUpdated(cluster.clone()));
        self.persist_cluster(&cluster);
        self.remote_sync_cluster(&cluster);
        for note in &moved {
            self.emit(DomainEvent::NoteUpdated(note.clone()));
            self.persist_note(note);
            self.remote_sync_note(note);
        }
    }

    /// Clear a note's cluster membership without persistence; callers
    /// handle mirrors. Recomputes the abandoned cluster's centroid in
    /// memory and persists that cluster.
    fn detach_from_cluster(&mut self, note_id: &str) {
        let Some(previous) = self
            .notes
            .get_mut(note_id)
            .and_then(|n| n.cluster_id.take())
        else {
            return;
        };
        let mut removed = false;
        if let Some(cluster) = self.clusters.get_mut(&previous) {
            removed = cluster.remove_child(note_id);
            if removed {
                cluster.modified = now_millis();
            }
        }
        if removed {
            self.commit_centroid(&previous);
        }
    }

    /// In-memory centroid recompute (transient preview). Empty clusters
    /// keep their last position.
    fn refresh_centroid(&mut self, cluster_id: &str) {
        let positions: Vec<(f64, f64)> = match self.clusters.get(cluster_id) {
            Some(cluster) => cluster
                .children
                .iter()
                .filter_map(|id| self.notes.get(id).map(|n| (n.x, n.y)))
                .collect(),
            None => return,
        };
        let Some((cx, cy)) = spatial::centroid(&positions) else {
            return;
        };
        if let Some(cluster) = self.clusters.get_mut(cluster_id) {
            cluster.x = cx;
            cluster.y = cy;
        }
    }

    /// Centroid recompute with `modified` bump, persistence and remote
    /// sync (the commit path).
    fn commit_centroid(&mut self, cluster_id: &str) {
        self.refresh_centroid(cluster_id);
        if let Some(cluster) = self.clusters.get_mut(cluster_id) {
            cluster.modified = now_millis();
            let cluster = cluster.clone();
            self.emit(DomainEvent::ClusterUpdated(cluster.clone()));
            self.persist_cluster(&cluster);
            self.remote_sync_cluster(&cluster);
        }
    }

    //
    // LINK ACTIONS
    //

    /// Explicitly link two notes. No-op when the endpoints are equal,
    /// either is unknown, or an unordered-pair link already exists.
    /// Pushes the symmetric reference entries on both notes atomically
    /// with the link insert, so this path converges to the same
    /// invariant as content-driven reconciliation.
    pub fn add_link(&mut self, a: &str, b: &str) -> Option<String> {
        if a == b {
            debug!("add_link: self-link {a}, ignoring");
            return None;
        }
        if !self.notes.contains_key(a) || !self.notes.contains_key(b) {
            debug!("add_link: unknown endpoint, ignoring");
            return None;
        }
        if link_sync::find_link_between(a, b, &self.links).is_some() {
            debug!("add_link: link between {a} and {b} already exists, ignoring");
            return None;
        }

        let link = Link::new(a, b);
        let link_id = link.id.clone();
        self.links.insert(link_id.clone(), link.clone());

        let mut endpoints = Vec::new();
        for (this, other) in [(a, b), (b, a)] {
            if let Some(note) = self.notes.get_mut(this) {
                if !note.references.iter().any(|r| r == other) {
                    note.references.push(other.to_string());
                    note.modified = now_millis();
                }
                endpoints.push(note.clone());
            }
        }

        self.emit(DomainEvent::LinkCreated(link.clone()));
        self.persist_link(&link);
        self.remote_sync_link(&link);
        for note in &endpoints {
            self.emit(DomainEvent::NoteUpdated(note.clone()));
            self.persist_note(note);
            self.remote_sync_note(note);
        }

        Some(link_id)
    }

    /// Delete a link and symmetrically strip both endpoints' references.
    pub fn delete_link(&mut self, id: &str) {
        let Some(link) = self.links.remove(id) else {
            debug!("delete_link: unknown link {id}, ignoring");
            return;
        };

        let mut endpoints = Vec::new();
        for (this, other) in [
            (link.source_id.clone(), link.target_id.clone()),
            (link.target_id.clone(), link.source_id.clone()),
        ] {
            if let Some(note) = self.notes.get_mut(&this) {
                let before = note.references.len();
                note.references.retain(|r| r != &other);
                if note.references.len() != before {
                    note.modified = now_millis();
                    endpoints.push(note.clone());
                }
            }
        }

        self.emit(DomainEvent::LinkDeleted { id: id.to_string() });
        self.persist_delete_link(id);
        self.remote_delete_link(id);
        for note in &endpoints {
            self.emit(DomainEvent::NoteUpdated(note.clone()));
            self.persist_note(note);
            self.remote_sync_note(note);
        }
    }

    /// Update a link's display metadata. Endpoints and references are
    /// untouchable through this path.
    pub fn update_link(&mut self, id: &str, update: LinkUpdate) {
        let Some(link) = self.links.get_mut(id) else {
            debug!("update_link: unknown link {id}, ignoring");
            return;
        };
        update.apply_to(link);
        link.modified = now_millis();
        let link = link.clone();

        self.emit(DomainEvent::LinkUpdated(link.clone()));
        self.persist_link(&link);
        self.remote_sync_link(&link);
    }

    //
    // IMPORT / EXPORT
    //

    /// Serialize the full entity maps with a version tag and timestamp.
    pub fn export_data(&self) -> ExportData {
        ExportData {
            version: EXPORT_VERSION,
            export_date: chrono::Utc::now().to_rfc3339(),
            data: ExportPayload {
                notes: self.notes.clone(),
                clusters: self.clusters.clone(),
                links: self.links.clone(),
            },
        }
    }

    /// Restore from a backup: validates the minimal shape (`data.notes`
    /// present), then replaces in-memory state wholesale and queues a
    /// full write-through to the local store. Restore semantics, not
    /// merge - existing local data is overwritten.
    pub fn import_data(
        &mut self,
        value: serde_json::Value,
    ) -> Result<ImportSummary, ImportError> {
        let Some(data) = value.get("data") else {
            return Err(ImportError::InvalidFormat(
                "missing top-level 'data' object".to_string(),
            ));
        };
        if data.get("notes").is_none() {
            return Err(ImportError::MissingNotes);
        }
        let export: ExportData = serde_json::from_value(value)
            .map_err(|e| ImportError::InvalidFormat(e.to_string()))?;

        self.notes = export.data.notes;
        self.clusters = export.data.clusters;
        self.links = export.data.links;
        self.selection.clear();
        self.editing = None;
        self.drag = None;

        let summary = ImportSummary {
            notes: self.notes.len(),
            clusters: self.clusters.len(),
            links: self.links.len(),
        };
        info!(
            notes = summary.notes,
            clusters = summary.clusters,
            links = summary.links,
            "Imported canvas state"
        );
        self.emit(DomainEvent::StateReplaced);

        let store = Arc::clone(&self.store);
        let notes = self.notes.clone();
        let clusters = self.clusters.clone();
        let links = self.links.clone();
        tokio::spawn(async move {
            if let Err(e) = store.replace_all(&notes, &clusters, &links).await {
                warn!("Failed to persist imported state: {e:#}");
            }
        });

        Ok(summary)
    }

    //
    // REMOTE SYNC
    //

    /// Bind the configured gateway to a user namespace and run the
    /// one-time migration guard: purely-local data is uploaded only when
    /// the remote namespace shows no evidence of prior use. A sentinel
    /// without entities means the account was intentionally emptied on
    /// another device - nothing is re-uploaded, and the next incoming
    /// snapshot empties local state too.
    pub async fn initialize_sync(&self, user_id: &str) -> Result<(), CanvasServiceError> {
        let gateway = self.gateway.as_ref().ok_or(CanvasServiceError::NoGateway)?;

        gateway
            .initialize(user_id)
            .await
            .map_err(|e| CanvasServiceError::sync_init_failed(format!("{e:#}")))?;

        let presence = gateway
            .has_remote_data()
            .await
            .map_err(|e| CanvasServiceError::sync_init_failed(format!("{e:#}")))?;

        if presence.is_untouched() {
            info!("Remote namespace untouched, migrating local data");
            gateway
                .migrate_local_data(&self.notes, &self.clusters, &self.links)
                .await
                .map_err(|e| CanvasServiceError::sync_init_failed(format!("{e:#}")))?;
        } else {
            info!(
                sentinel = presence.sentinel,
                entities = presence.entities,
                "Remote namespace in use, skipping local migration"
            );
        }

        Ok(())
    }

    /// Merge an incoming full-collection notes snapshot (last-writer-wins
    /// per note, remote priority on ties). Every incoming entity is
    /// write-through cached to the local store regardless of whether it
    /// won; notes dropped from the snapshot are removed locally too.
    pub fn apply_remote_notes(&mut self, snapshot: NotesSnapshot) {
        for note in snapshot.values() {
            self.persist_note(note);
        }

        let outcome = merge::merge_remote_notes(&self.notes, snapshot);

        for id in &outcome.dropped {
            self.selection.remove(id);
            if self.editing.as_deref() == Some(id.as_str()) {
                self.editing = None;
            }
            self.emit(DomainEvent::NoteDeleted { id: id.clone() });
            self.persist_delete_note(id);
        }
        for (id, merged_note) in &outcome.merged {
            if self.notes.get(id) != Some(merged_note) {
                self.emit(DomainEvent::NoteUpdated(merged_note.clone()));
            }
        }

        self.notes = outcome.merged;
    }

    /// Replace the cluster collection with a remote snapshot (no
    /// timestamp merge; cluster churn is low-frequency).
    pub fn apply_remote_clusters(&mut self, snapshot: ClustersSnapshot) {
        for cluster in snapshot.values() {
            self.persist_cluster(cluster);
        }
        for id in self.clusters.keys() {
            if !snapshot.contains_key(id) {
                self.persist_delete_cluster(id);
            }
        }
        self.clusters = snapshot;
        self.emit(DomainEvent::ClustersReplaced);
    }

    /// Replace the link collection with a remote snapshot.
    pub fn apply_remote_links(&mut self, snapshot: LinksSnapshot) {
        for link in snapshot.values() {
            self.persist_link(link);
        }
        for id in self.links.keys() {
            if !snapshot.contains_key(id) {
                self.persist_delete_link(id);
            }
        }
        self.links = snapshot;
        self.emit(DomainEvent::LinksReplaced);
    }

    /// Unconditionally re-sync every local entity to the remote store.
    /// This is the manual reconciliation pass that recovers from lost
    /// fire-and-forget writes; per-entity failures are logged and
    /// counted, never fatal.
    pub async fn force_push_all(&self) -> Result<PushSummary, CanvasServiceError> {
        let gateway = self.gateway.as_ref().ok_or(CanvasServiceError::NoGateway)?;
        let mut summary = PushSummary::default();

        for note in self.notes.values() {
            summary.attempted += 1;
            if let Err(e) = gateway.sync_note(note).await {
                warn!("force_push_all: note {} failed: {e:#}", note.id);
                summary.failed += 1;
            }
        }
        for cluster in self.clusters.values() {
            summary.attempted += 1;
            if let Err(e) = gateway.sync_cluster(cluster).await {
                warn!("force_push_all: cluster {} failed: {e:#}", cluster.id);
                summary.failed += 1;
            }
        }
        for link in self.links.values() {
            summary.attempted += 1;
            if let Err(e) = gateway.sync_link(link).await {
                warn!("force_push_all: link {} failed: {e:#}", link.id);
                summary.failed += 1;
            }
        }

        info!(
            attempted = summary.attempted,
            failed = summary.failed,
            "Completed full push"
        );
        Ok(summary)
    }

    //
    // FIRE-AND-FORGET MIRRORS
    //
    // Each helper clones what it needs and spawns a task with its own
    // error boundary. Failures are logged and swallowed; the in-memory
    // state has already moved on.
    //

    fn persist_note(&self, note: &Note) {
        let store = Arc::clone(&self.store);
        let note = note.clone();
        tokio::spawn(async move {
            if let Err(e) = store.upsert_note(&note).await {
                warn!("Failed to persist note {}: {e:#}", note.id);
            }
        });
    }

    fn persist_cluster(&self, cluster: &Cluster) {
        let store = Arc::clone(&self.store);
        let cluster = cluster.clone();
        tokio::spawn(async move {
            if let Err(e) = store.upsert_cluster(&cluster).await {
                warn!("Failed to persist cluster {}: {e:#}", cluster.id);
            }
        });
    }

    fn persist_link(&self, link: &Link) {
        let store = Arc::clone(&self.store);
        let link = link.clone();
        tokio::spawn(async move {
            if let Err(e) = store.upsert_link(&link).await {
                warn!("Failed to persist link {}: {e:#}", link.id);
            }
        });
    }

    fn persist_delete_note(&self, id: &str) {
        let store = Arc::clone(&self.store);
        let id = id.to_string();
        tokio::spawn(async move {
            if let Err(e) = store.delete_note(&id).await {
                warn!("Failed to delete persisted note {id}: {e:#}");
            }
        });
    }

    fn persist_delete_cluster(&self, id: &str) {
        let store = Arc::clone(&self.store);
        let id = id.to_string();
        tokio::spawn(async move {
            if let Err(e) = store.delete_cluster(&id).await {
                warn!("Failed to delete persisted cluster {id}: {e:#}");
            }
        });
    }

    fn persist_delete_link(&self, id: &str) {
        let store = Arc::clone(&self.store);
        let id = id.to_string();
        tokio::spawn(async move {
            if let Err(e) = store.delete_link(&id).await {
                warn!("Failed to delete persisted link {id}: {e:#}");
            }
        });
    }

    fn remote_sync_note(&self, note: &Note) {
        if let Some(gateway) = &self.gateway {
            let gateway = Arc::clone(gateway);
            let note = note.clone();
            tokio::spawn(async move {
                if let Err(e) = gateway.sync_note(&note).await {
                    warn!("Remote sync failed for note {}: {e:#}", note.id);
                }
            });
        }
    }

    fn remote_sync_cluster(&self, cluster: &Cluster) {
        if let Some(gateway) = &self.gateway {
            let gateway = Arc::clone(gateway);
            let cluster = cluster.clone();
            tokio::spawn(async move {
                if let Err(e) = gateway.sync_cluster(&cluster).await {
                    warn!("Remote sync failed for cluster {}: {e:#}", cluster.id);
                }
            });
        }
    }

    fn remote_sync_link(&self, link: &Link) {
        if let Some(gateway) = &self.gateway {
            let gateway = Arc::clone(gateway);
            let link = link.clone();
            tokio::spawn(async move {
                if let Err(e) = gateway.sync_link(&link).await {
                    warn!("Remote sync failed for link {}: {e:#}", link.id);
                }
            });
        }
    }

    fn remote_delete_note(&self, id: &str) {
        if let Some(gateway) = &self.gateway {
            let gateway = Arc::clone(gateway);
            let id = id.to_string();
            tokio::spawn(async move {
                if let Err(e) = gateway.delete_note(&id).await {
                    warn!("Remote delete failed for note {id}: {e:#}");
                }
            });
        }
    }

    fn remote_delete_cluster(&self, id: &str) {
        if let Some(gateway) = &self.gateway {
            let gateway = Arc::clone(gateway);
            let id = id.to_string();
            tokio::spawn(async move {
                if let Err(e) = gateway.delete_cluster(&id).await {
                    warn!("Remote delete failed for cluster {id}: {e:#}");
                }
            });
        }
    }

    fn remote_delete_link(&self, id: &str) {
        if let Some(gateway) = &self.gateway {
            let gateway = Arc::clone(gateway);
            let id = id.to_string();
            tokio::spawn(async move {
                if let Err(e) = gateway.delete_link(&id).await {
                    warn!("Remote delete failed for link {id}: {e:#}");
                }
            });
        }
    }
}
