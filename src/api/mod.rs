//! Client side of the shopping list server API.

mod client;
mod error;

pub use client::{HttpRemoteStore, RemoteStore};
pub use error::ApiError;
