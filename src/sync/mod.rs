//! Synchronization between the local store and the remote server.
//!
//! The engine converges the two stores with a last-write-wins policy on
//! `updated_at` and tombstone-based soft deletion: a local delete marks
//! the record, the next pass propagates it to the server and only then
//! removes the row. Passes are triggered by debounced change signals
//! from the local store, or explicitly.

mod engine;
mod error;

pub use engine::{SyncEngine, SyncOutcome, DEBOUNCE_WINDOW};
pub use error::SyncError;
