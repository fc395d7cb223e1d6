//! Domain Events
//!
//! Events emitted by `CanvasService` after each successful in-memory
//! mutation, following the observer pattern: consumers (rendering layer,
//! sync status indicators, tests) subscribe via a tokio broadcast channel
//! without coupling to the store's internals.
//!
//! Because every persistence and remote write is fire-and-forget, this
//! stream is also the observable record of what *should* be mirrored -
//! a consumer that cares about durability can watch it and drive a
//! `force_push_all` when needed.

use crate::models::{Cluster, Link, Note};

/// Domain events emitted by `CanvasService`.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A new note was created
    NoteCreated(Note),

    /// An existing note was updated (content, metadata or committed position)
    NoteUpdated(Note),

    /// A note was deleted (after its cascade completed in memory)
    NoteDeleted { id: String },

    /// A new cluster was created
    ClusterCreated(Cluster),

    /// An existing cluster was updated (membership, centroid or position)
    ClusterUpdated(Cluster),

    /// A cluster was deleted (its notes survive)
    ClusterDeleted { id: String },

    /// A new link was created (explicitly or from content references)
    LinkCreated(Link),

    /// A link's display metadata was updated
    LinkUpdated(Link),

    /// A link was deleted
    LinkDeleted { id: String },

    /// The full state was replaced by an import/restore
    StateReplaced,

    /// The cluster collection was replaced by a remote snapshot
    ClustersReplaced,

    /// The link collection was replaced by a remote snapshot
    LinksReplaced,
}

impl DomainEvent {
    /// Get a string representation of the event type, for logging and
    /// debugging.
    pub fn event_type(&self) -> &str {
        match self {
            DomainEvent::NoteCreated(_) => "note:created",
            DomainEvent::NoteUpdated(_) => "note:updated",
            DomainEvent::NoteDeleted { .. } => "note:deleted",
            DomainEvent::ClusterCreated(_) => "cluster:created",
            DomainEvent::ClusterUpdated(_) => "cluster:updated",
            DomainEvent::ClusterDeleted { .. } => "cluster:deleted",
            DomainEvent::LinkCreated(_) => "link:created",
            DomainEvent::LinkUpdated(_) => "link:updated",
            DomainEvent::LinkDeleted { .. } => "link:deleted",
            DomainEvent::StateReplaced => "state:replaced",
            DomainEvent::ClustersReplaced => "clusters:replaced",
            DomainEvent::LinksReplaced => "links:replaced",
        }
    }
}
