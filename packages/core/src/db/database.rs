//! Local Durable Store
//!
//! `DatabaseService` owns the embedded libsql database holding the
//! persisted copies of notes, clusters and links. Each entity type gets
//! its own table with the same shape: `(id, data, modified)` where `data`
//! is the entity's camelCase JSON, byte-identical to the export format.
//!
//! The in-memory maps inside `CanvasService` are authoritative for the
//! running session; these tables are the eventually-consistent mirror
//! that survives process restarts. Writes arrive fire-and-forget from the
//! service, so every method here is a self-contained operation with no
//! cross-entity ordering guarantees.

use std::path::PathBuf;

use libsql::{Builder, Connection};

use super::error::DatabaseError;

/// Entity tables managed by this service.
const TABLES: [&str; 3] = ["notes", "clusters", "links"];

/// Embedded libsql database for the local durable store.
#[derive(Clone)]
pub struct DatabaseService {
    /// Single shared connection, opened at construction and reused by
    /// every operation. A `:memory:` database lives inside its
    /// connection - a fresh connect would see a separate empty database,
    /// so all access must go through this handle.
    conn: Connection,
}

impl DatabaseService {
    /// Open (or create) the database file at `db_path` and initialize the
    /// schema.
    ///
    /// Ensures the parent directory exists, enables WAL mode, a busy
    /// timeout and foreign keys, and creates the entity tables with
    /// `CREATE TABLE IF NOT EXISTS` so initialization is idempotent.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;
        let conn = db.connect().map_err(DatabaseError::LibsqlError)?;

        let service = Self { conn };
        service.initialize_schema().await?;
        Ok(service)
    }

    /// Open an in-memory database. Used by tests and ephemeral sessions.
    pub async fn new_in_memory() -> Result<Self, DatabaseError> {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(PathBuf::from(":memory:"), e))?;
        let conn = db.connect().map_err(DatabaseError::LibsqlError)?;

        let service = Self { conn };
        service.initialize_schema().await?;
        Ok(service)
    }

    /// Execute a PRAGMA statement.
    ///
    /// PRAGMA statements return rows, so we must use query() instead of
    /// execute().
    async fn execute_pragma(
        &self,
        conn: &Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to prepare '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.execute_pragma(&self.conn, "PRAGMA journal_mode = WAL")
            .await?;
        self.execute_pragma(&self.conn, "PRAGMA busy_timeout = 5000")
            .await?;
        self.execute_pragma(&self.conn, "PRAGMA foreign_keys = ON")
            .await?;

        for table in TABLES {
            self.conn
                .execute(
                    &format!(
                        "CREATE TABLE IF NOT EXISTS {table} (
                            id TEXT PRIMARY KEY,
                            data JSON NOT NULL,
                            modified INTEGER NOT NULL DEFAULT 0
                        )"
                    ),
                    (),
                )
                .await
                .map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to create {table} table: {e}"))
                })?;

            self.conn
                .execute(
                    &format!(
                        "CREATE INDEX IF NOT EXISTS idx_{table}_modified ON {table}(modified)"
                    ),
                    (),
                )
                .await
                .map_err(|e| {
                    DatabaseError::sql_execution(format!(
                        "Failed to create index 'idx_{table}_modified': {e}"
                    ))
                })?;
        }

        Ok(())
    }

    /// Insert or replace one entity row.
    pub async fn upsert(
        &self,
        table: &'static str,
        id: &str,
        data: &str,
        modified: i64,
    ) -> Result<(), DatabaseError> {
        self.conn
            .execute(
                &format!(
                    "INSERT INTO {table} (id, data, modified) VALUES (?1, ?2, ?3)
                     ON CONFLICT(id) DO UPDATE SET data = excluded.data, modified = excluded.modified"
                ),
                (id, data, modified),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to upsert into {table}: {e}"))
            })?;
        Ok(())
    }

    /// Delete one entity row. Deleting a missing row is not an error.
    pub async fn delete(&self, table: &'static str, id: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute(&format!("DELETE FROM {table} WHERE id = ?1"), [id])
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to delete from {table}: {e}"))
            })?;
        Ok(())
    }

    /// Fetch every `(id, data)` pair from a table.
    pub async fn get_all(
        &self,
        table: &'static str,
    ) -> Result<Vec<(String, String)>, DatabaseError> {
        let mut rows = self
            .conn
            .query(&format!("SELECT id, data FROM {table}"), ())
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to query {table}: {e}"))
            })?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(DatabaseError::LibsqlError)? {
            let id: String = row.get(0).map_err(DatabaseError::LibsqlError)?;
            let data: String = row.get(1).map_err(DatabaseError::LibsqlError)?;
            out.push((id, data));
        }
        Ok(out)
    }

    /// Replace a table's full contents in one transaction.
    ///
    /// This is the bulk-put path behind import/restore: the existing rows
    /// are dropped wholesale, never merged.
    pub async fn replace_all(
        &self,
        table: &'static str,
        rows: &[(String, String, i64)],
    ) -> Result<(), DatabaseError> {
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(DatabaseError::LibsqlError)?;

        tx.execute(&format!("DELETE FROM {table}"), ())
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to clear {table}: {e}")))?;

        for (id, data, modified) in rows {
            tx.execute(
                &format!("INSERT INTO {table} (id, data, modified) VALUES (?1, ?2, ?3)"),
                (id.as_str(), data.as_str(), *modified),
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to bulk-insert into {table}: {e}"))
            })?;
        }

        tx.commit().await.map_err(DatabaseError::LibsqlError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_init_is_idempotent() {
        let db = DatabaseService::new_in_memory().await.unwrap();
        // Second init against the same handle must not fail
        db.initialize_schema().await.unwrap();
    }

    #[tokio::test]
    async fn upsert_overwrites_existing_row() {
        let db = DatabaseService::new_in_memory().await.unwrap();
        db.upsert("notes", "n1", r#"{"v":1}"#, 10).await.unwrap();
        db.upsert("notes", "n1", r#"{"v":2}"#, 20).await.unwrap();

        let rows = db.get_all("notes").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1, r#"{"v":2}"#);
    }

    #[tokio::test]
    async fn in_memory_state_is_shared_across_operations_and_clones() {
        let db = DatabaseService::new_in_memory().await.unwrap();
        db.upsert("notes", "n1", "{}", 1).await.unwrap();

        // The schema and rows must be visible to later operations,
        // including through cloned handles
        let clone = db.clone();
        clone.delete("links", "ghost").await.unwrap();
        let rows = clone.get_all("notes").await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn delete_missing_row_is_ok() {
        let db = DatabaseService::new_in_memory().await.unwrap();
        db.delete("links", "ghost").await.unwrap();
    }

    #[tokio::test]
    async fn replace_all_drops_previous_rows() {
        let db = DatabaseService::new_in_memory().await.unwrap();
        db.upsert("clusters", "c1", "{}", 1).await.unwrap();

        db.replace_all(
            "clusters",
            &[("c2".to_string(), "{}".to_string(), 2)],
        )
        .await
        .unwrap();

        let rows = db.get_all("clusters").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "c2");
    }

    #[tokio::test]
    async fn on_disk_database_survives_reopen() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("canvas.db");

        {
            let db = DatabaseService::new(path.clone()).await.unwrap();
            db.upsert("notes", "n1", "{}", 5).await.unwrap();
        }

        let db = DatabaseService::new(path).await.unwrap();
        let rows = db.get_all("notes").await.unwrap();
        assert_eq!(rows.len(), 1);
    }
}
