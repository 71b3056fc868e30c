//! Reference implementation of the shopping list server API.
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint
//! - `GET /api/shopping-items`: Full item list
//! - `POST /api/shopping-items`: Create (or replace) one item
//! - `PUT /api/shopping-items/{id}`: Update one item
//! - `DELETE /api/shopping-items/{id}`: Delete one item

pub mod storage;

pub use storage::ServerStorage;

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Serialize;

use crate::models::RemoteShoppingItem;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<ServerStorage>,
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/shopping-items", get(list_items).post(create_item))
        .route(
            "/api/shopping-items/{id}",
            put(update_item).delete(delete_item),
        )
        .with_state(state)
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_items(State(state): State<AppState>) -> Json<Vec<RemoteShoppingItem>> {
    Json(state.storage.list().await)
}

async fn create_item(
    State(state): State<AppState>,
    Json(item): Json<RemoteShoppingItem>,
) -> (StatusCode, Json<RemoteShoppingItem>) {
    tracing::debug!("Creating item {}", item.id);
    let created = state.storage.upsert(item).await;
    (StatusCode::CREATED, Json(created))
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut item): Json<RemoteShoppingItem>,
) -> Result<Json<RemoteShoppingItem>, StatusCode> {
    // The path id is canonical; a mismatched body id is overridden
    item.id = id.clone();
    match state.storage.update(&id, item).await {
        Some(updated) => Ok(Json(updated)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn delete_item(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    if state.storage.remove(&id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
