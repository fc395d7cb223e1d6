//! Remote Sync Layer
//!
//! Bidirectional reconciliation with a remote document store:
//!
//! - [`RemoteGateway`] - the transport abstraction (per-entity writes,
//!   per-collection snapshot subscriptions, sentinel-guarded migration)
//! - [`merge`] - the pure merge policy applied to incoming snapshots
//! - [`InMemoryGateway`] - process-local implementation for tests and
//!   accounts without a configured remote
//!
//! The write side is strictly best-effort fire-and-forget: there is no
//! retry queue, so a failed remote write is logged and stays lost until
//! the next entity edit or an explicit full push.

mod gateway;
mod memory;
pub mod merge;

pub use gateway::{
    ClustersSnapshot, LinksSnapshot, NotesSnapshot, RemoteGateway, RemotePresence,
};
pub use memory::InMemoryGateway;
