//! Shopsync
//!
//! An offline-first shopping list. Items live in a local SQLite store
//! and on a remote HTTP server; the sync engine converges the two with
//! a last-write-wins policy and tombstone-based soft deletion, so edits
//! made offline survive and deletions propagate before rows disappear.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod server;
pub mod sync;

pub use api::{ApiError, HttpRemoteStore, RemoteStore};
pub use config::Config;
pub use db::{init_db, ItemRepository};
pub use models::{RemoteShoppingItem, ShoppingItem};
pub use sync::{SyncEngine, SyncError, SyncOutcome};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
