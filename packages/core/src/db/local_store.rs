//! LocalStore Trait - Persistence Abstraction Layer
//!
//! This module defines the `LocalStore` trait that abstracts the durable
//! on-device tables for notes, clusters and links. The trait sits between
//! `CanvasService` (business logic) and the storage implementation, so
//! tests and alternative backends can swap in without changing the core.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: all methods are async; the default backend is an
//!    embedded libsql database but the trait also admits networked stores
//! 2. **Ownership Semantics**: write methods borrow entities; the store
//!    serializes what it needs and never retains references
//! 3. **Error Handling**: `anyhow::Result` at the boundary for flexible
//!    error context; callers treat failures as log-and-continue
//! 4. **Fire-and-forget friendly**: every method is a self-contained
//!    operation so the service can dispatch them without awaiting order

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{Cluster, Link, Note};

use super::database::DatabaseService;

/// Abstraction over the durable local tables.
///
/// Implementations must be `Send + Sync`; the service shares them across
/// spawned persistence tasks via `Arc<dyn LocalStore>`.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Insert or replace a note row.
    async fn upsert_note(&self, note: &Note) -> Result<()>;

    /// Insert or replace a cluster row.
    async fn upsert_cluster(&self, cluster: &Cluster) -> Result<()>;

    /// Insert or replace a link row.
    async fn upsert_link(&self, link: &Link) -> Result<()>;

    /// Delete a note row (idempotent).
    async fn delete_note(&self, id: &str) -> Result<()>;

    /// Delete a cluster row (idempotent).
    async fn delete_cluster(&self, id: &str) -> Result<()>;

    /// Delete a link row (idempotent).
    async fn delete_link(&self, id: &str) -> Result<()>;

    /// Load every persisted note, keyed by ID.
    async fn all_notes(&self) -> Result<HashMap<String, Note>>;

    /// Load every persisted cluster, keyed by ID.
    async fn all_clusters(&self) -> Result<HashMap<String, Cluster>>;

    /// Load every persisted link, keyed by ID.
    async fn all_links(&self) -> Result<HashMap<String, Link>>;

    /// Replace the full persisted state in one shot (import/restore path).
    async fn replace_all(
        &self,
        notes: &HashMap<String, Note>,
        clusters: &HashMap<String, Cluster>,
        links: &HashMap<String, Link>,
    ) -> Result<()>;
}

/// `LocalStore` implementation over the embedded libsql database.
///
/// Thin delegation wrapper: serialization to the `(id, data, modified)`
/// row shape happens here, SQL lives in [`DatabaseService`].
pub struct TursoStore {
    db: Arc<DatabaseService>,
}

impl TursoStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    fn encode<T: serde::Serialize>(entity: &T, what: &'static str) -> Result<String> {
        serde_json::to_string(entity).with_context(|| format!("failed to encode {what}"))
    }

    fn decode_all<T: serde::de::DeserializeOwned>(
        rows: Vec<(String, String)>,
        what: &'static str,
    ) -> Result<HashMap<String, T>> {
        let mut out = HashMap::with_capacity(rows.len());
        for (id, data) in rows {
            let entity: T = serde_json::from_str(&data)
                .with_context(|| format!("failed to decode {what} row {id}"))?;
            out.insert(id, entity);
        }
        Ok(out)
    }
}

#[async_trait]
impl LocalStore for TursoStore {
    async fn upsert_note(&self, note: &Note) -> Result<()> {
        let data = Self::encode(note, "note")?;
        self.db
            .upsert("notes", &note.id, &data, note.modified)
            .await?;
        Ok(())
    }

    async fn upsert_cluster(&self, cluster: &Cluster) -> Result<()> {
        let data = Self::encode(cluster, "cluster")?;
        self.db
            .upsert("clusters", &cluster.id, &data, cluster.modified)
            .await?;
        Ok(())
    }

    async fn upsert_link(&self, link: &Link) -> Result<()> {
        let data = Self::encode(link, "link")?;
        self.db
            .upsert("links", &link.id, &data, link.modified)
            .await?;
        Ok(())
    }

    async fn delete_note(&self, id: &str) -> Result<()> {
        self.db.delete("notes", id).await?;
        Ok(())
    }

    async fn delete_cluster(&self, id: &str) -> Result<()> {
        self.db.delete("clusters", id).await?;
        Ok(())
    }

    async fn delete_link(&self, id: &str) -> Result<()> {
        self.db.delete("links", id).await?;
        Ok(())
    }

    async fn all_notes(&self) -> Result<HashMap<String, Note>> {
        Self::decode_all(self.db.get_all("notes").await?, "note")
    }

    async fn all_clusters(&self) -> Result<HashMap<String, Cluster>> {
        Self::decode_all(self.db.get_all("clusters").await?, "cluster")
    }

    async fn all_links(&self) -> Result<HashMap<String, Link>> {
        Self::decode_all(self.db.get_all("links").await?, "link")
    }

    async fn replace_all(
        &self,
        notes: &HashMap<String, Note>,
        clusters: &HashMap<String, Cluster>,
        links: &HashMap<String, Link>,
    ) -> Result<()> {
        let note_rows: Vec<_> = notes
            .values()
            .map(|n| Ok((n.id.clone(), Self::encode(n, "note")?, n.modified)))
            .collect::<Result<_>>()?;
        let cluster_rows: Vec<_> = clusters
            .values()
            .map(|c| Ok((c.id.clone(), Self::encode(c, "cluster")?, c.modified)))
            .collect::<Result<_>>()?;
        let link_rows: Vec<_> = links
            .values()
            .map(|l| Ok((l.id.clone(), Self::encode(l, "link")?, l.modified)))
            .collect::<Result<_>>()?;

        self.db.replace_all("notes", &note_rows).await?;
        self.db.replace_all("clusters", &cluster_rows).await?;
        self.db.replace_all("links", &link_rows).await?;
        Ok(())
    }
}
