//! Service Layer Error Types
//!
//! Most canvas mutations never fail: invalid inputs are silent no-ops
//! and I/O failures are logged fire-and-forget. The types here cover the
//! few paths that do surface errors - startup hydration, explicit sync
//! initialization, and the user-initiated import of a backup file.

use thiserror::Error;

/// Errors surfaced by `CanvasService`'s fallible operations.
#[derive(Error, Debug)]
pub enum CanvasServiceError {
    /// Persisted state could not be loaded at startup
    #[error("Failed to load persisted canvas state: {0:#}")]
    StateLoadFailed(#[source] anyhow::Error),

    /// A sync operation was requested but no remote gateway is configured
    #[error("No remote gateway configured")]
    NoGateway,

    /// Remote sync initialization failed
    #[error("Sync initialization failed: {context}")]
    SyncInitFailed { context: String },
}

impl CanvasServiceError {
    /// Create a sync initialization error
    pub fn sync_init_failed(context: impl Into<String>) -> Self {
        Self::SyncInitFailed {
            context: context.into(),
        }
    }
}

/// Import is the one deliberately user-visible failure path: restoring a
/// backup is a high-stakes bulk replace, so a malformed file produces a
/// structured error instead of a silent no-op.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The file is not a JSON object of the expected shape
    #[error("Invalid backup file: {0}")]
    InvalidFormat(String),

    /// `data.notes` is missing - the minimal shape requirement
    #[error("Invalid backup file: missing data.notes")]
    MissingNotes,
}
