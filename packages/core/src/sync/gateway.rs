//! RemoteGateway Trait - Remote Sync Abstraction
//!
//! Abstraction over a remote document store scoped to an authenticated
//! user's namespace: per-entity upsert/delete plus per-collection
//! snapshot subscriptions. `CanvasService` calls the write side
//! fire-and-forget; the embedding application drains the subscription
//! receivers and feeds snapshots back into the service's merge path.
//!
//! Subscriptions use tokio broadcast channels carrying the full
//! collection map for the entity type. Snapshot delivery is best-effort:
//! a lagging subscriber simply misses intermediate snapshots, and the
//! next one carries the complete state anyway.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::broadcast;

use crate::models::{Cluster, Link, Note};

/// Full-collection snapshot pushed on every remote change.
pub type NotesSnapshot = HashMap<String, Note>;
pub type ClustersSnapshot = HashMap<String, Cluster>;
pub type LinksSnapshot = HashMap<String, Link>;

/// What the remote namespace currently contains, used by the one-time
/// migration guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemotePresence {
    /// The sentinel "metadata" marker exists - this namespace has been
    /// used before, even if it holds no entities right now.
    pub sentinel: bool,
    /// At least one entity document exists.
    pub entities: bool,
}

impl RemotePresence {
    /// A namespace with neither sentinel nor entities has never been
    /// used; only then is it safe to upload purely-local data.
    pub fn is_untouched(&self) -> bool {
        !self.sentinel && !self.entities
    }
}

/// Abstraction over the remote document store.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Bind the gateway to a user's namespace and start change streams.
    async fn initialize(&self, user_id: &str) -> Result<()>;

    /// Tear down subscriptions and drop the namespace binding.
    async fn cleanup(&self) -> Result<()>;

    /// Upsert one note document.
    async fn sync_note(&self, note: &Note) -> Result<()>;

    /// Upsert one cluster document.
    async fn sync_cluster(&self, cluster: &Cluster) -> Result<()>;

    /// Upsert one link document.
    async fn sync_link(&self, link: &Link) -> Result<()>;

    /// Delete one note document (idempotent).
    async fn delete_note(&self, id: &str) -> Result<()>;

    /// Delete one cluster document (idempotent).
    async fn delete_cluster(&self, id: &str) -> Result<()>;

    /// Delete one link document (idempotent).
    async fn delete_link(&self, id: &str) -> Result<()>;

    /// Inspect the namespace for the migration guard.
    async fn has_remote_data(&self) -> Result<RemotePresence>;

    /// One-time upload of purely-local data into an untouched namespace.
    /// Writes the sentinel marker so later devices never re-upload.
    async fn migrate_local_data(
        &self,
        notes: &NotesSnapshot,
        clusters: &ClustersSnapshot,
        links: &LinksSnapshot,
    ) -> Result<()>;

    /// Subscribe to full-collection note snapshots.
    fn subscribe_notes(&self) -> broadcast::Receiver<NotesSnapshot>;

    /// Subscribe to full-collection cluster snapshots.
    fn subscribe_clusters(&self) -> broadcast::Receiver<ClustersSnapshot>;

    /// Subscribe to full-collection link snapshots.
    fn subscribe_links(&self) -> broadcast::Receiver<LinksSnapshot>;
}
