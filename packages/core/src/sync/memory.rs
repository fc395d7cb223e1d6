//! In-memory `RemoteGateway` implementation.
//!
//! Backs the test suite and doubles as a functional stand-in when no
//! remote account is configured: it keeps the namespace in process
//! memory and pushes a full-collection snapshot on every write, which is
//! exactly the contract a real backend's change streams provide.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

use crate::models::{Cluster, Link, Note};

use super::gateway::{
    ClustersSnapshot, LinksSnapshot, NotesSnapshot, RemoteGateway, RemotePresence,
};

const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
struct Namespace {
    user_id: Option<String>,
    sentinel: bool,
    notes: HashMap<String, Note>,
    clusters: HashMap<String, Cluster>,
    links: HashMap<String, Link>,
}

/// Process-local remote store with broadcast snapshot streams.
pub struct InMemoryGateway {
    state: Mutex<Namespace>,
    notes_tx: broadcast::Sender<NotesSnapshot>,
    clusters_tx: broadcast::Sender<ClustersSnapshot>,
    links_tx: broadcast::Sender<LinksSnapshot>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        let (notes_tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        let (clusters_tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        let (links_tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(Namespace::default()),
            notes_tx,
            clusters_tx,
            links_tx,
        }
    }

    /// Pre-seed remote state, for tests simulating a second device.
    pub fn seed(
        &self,
        notes: NotesSnapshot,
        clusters: ClustersSnapshot,
        links: LinksSnapshot,
    ) {
        let mut state = self.state.lock().unwrap();
        state.sentinel = true;
        state.notes = notes;
        state.clusters = clusters;
        state.links = links;
    }

    /// Mark the namespace as previously used without adding entities,
    /// simulating an account the user intentionally emptied elsewhere.
    pub fn seed_sentinel_only(&self) {
        self.state.lock().unwrap().sentinel = true;
    }

    /// Snapshot of the stored notes, for test assertions.
    pub fn remote_notes(&self) -> NotesSnapshot {
        self.state.lock().unwrap().notes.clone()
    }

    /// Snapshot of the stored links, for test assertions.
    pub fn remote_links(&self) -> LinksSnapshot {
        self.state.lock().unwrap().links.clone()
    }

    /// Snapshot of the stored clusters, for test assertions.
    pub fn remote_clusters(&self) -> ClustersSnapshot {
        self.state.lock().unwrap().clusters.clone()
    }

    /// Push the current note collection to subscribers, as a real
    /// backend does after any change in the collection.
    pub fn publish_notes(&self) {
        let snapshot = self.remote_notes();
        let _ = self.notes_tx.send(snapshot);
    }

    pub fn publish_clusters(&self) {
        let snapshot = self.remote_clusters();
        let _ = self.clusters_tx.send(snapshot);
    }

    pub fn publish_links(&self) {
        let snapshot = self.remote_links();
        let _ = self.links_tx.send(snapshot);
    }
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteGateway for InMemoryGateway {
    async fn initialize(&self, user_id: &str) -> Result<()> {
        self.state.lock().unwrap().user_id = Some(user_id.to_string());
        Ok(())
    }

    async fn cleanup(&self) -> Result<()> {
        self.state.lock().unwrap().user_id = None;
        Ok(())
    }

    async fn sync_note(&self, note: &Note) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.notes.insert(note.id.clone(), note.clone());
        }
        self.publish_notes();
        Ok(())
    }

    async fn sync_cluster(&self, cluster: &Cluster) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.clusters.insert(cluster.id.clone(), cluster.clone());
        }
        self.publish_clusters();
        Ok(())
    }

    async fn sync_link(&self, link: &Link) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.links.insert(link.id.clone(), link.clone());
        }
        self.publish_links();
        Ok(())
    }

    async fn delete_note(&self, id: &str) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.notes.remove(id);
        }
        self.publish_notes();
        Ok(())
    }

    async fn delete_cluster(&self, id: &str) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.clusters.remove(id);
        }
        self.publish_clusters();
        Ok(())
    }

    async fn delete_link(&self, id: &str) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.links.remove(id);
        }
        self.publish_links();
        Ok(())
    }

    async fn has_remote_data(&self) -> Result<RemotePresence> {
        let state = self.state.lock().unwrap();
        Ok(RemotePresence {
            sentinel: state.sentinel,
            entities: !state.notes.is_empty()
                || !state.clusters.is_empty()
                || !state.links.is_empty(),
        })
    }

    async fn migrate_local_data(
        &self,
        notes: &NotesSnapshot,
        clusters: &ClustersSnapshot,
        links: &LinksSnapshot,
    ) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.sentinel = true;
            state.notes = notes.clone();
            state.clusters = clusters.clone();
            state.links = links.clone();
        }
        self.publish_notes();
        self.publish_clusters();
        self.publish_links();
        Ok(())
    }

    fn subscribe_notes(&self) -> broadcast::Receiver<NotesSnapshot> {
        self.notes_tx.subscribe()
    }

    fn subscribe_clusters(&self) -> broadcast::Receiver<ClustersSnapshot> {
        self.clusters_tx.subscribe()
    }

    fn subscribe_links(&self) -> broadcast::Receiver<LinksSnapshot> {
        self.links_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteDraft;

    fn note(title: &str) -> Note {
        Note::from_draft(NoteDraft {
            title: title.to_string(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn untouched_namespace_reports_no_presence() {
        let gateway = InMemoryGateway::new();
        let presence = gateway.has_remote_data().await.unwrap();
        assert!(presence.is_untouched());
    }

    #[tokio::test]
    async fn migrate_writes_sentinel_and_entities() {
        let gateway = InMemoryGateway::new();
        let n = note("Apple");
        let notes = HashMap::from([(n.id.clone(), n)]);

        gateway
            .migrate_local_data(&notes, &HashMap::new(), &HashMap::new())
            .await
            .unwrap();

        let presence = gateway.has_remote_data().await.unwrap();
        assert!(presence.sentinel);
        assert!(presence.entities);
    }

    #[tokio::test]
    async fn writes_push_full_snapshots_to_subscribers() {
        let gateway = InMemoryGateway::new();
        let mut rx = gateway.subscribe_notes();

        let n = note("Apple");
        gateway.sync_note(&n).await.unwrap();

        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains_key(&n.id));

        gateway.delete_note(&n.id).await.unwrap();
        let snapshot = rx.recv().await.unwrap();
        assert!(snapshot.is_empty());
    }
}
