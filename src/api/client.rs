//! HTTP client for the shopping list server.
//!
//! The server exposes a plain JSON CRUD API:
//! - `GET    /api/shopping-items` — full item list
//! - `POST   /api/shopping-items` — create one item
//! - `PUT    /api/shopping-items/{id}` — update one item
//! - `DELETE /api/shopping-items/{id}` — delete one item

use async_trait::async_trait;
use reqwest::StatusCode;

use super::error::ApiError;
use crate::models::RemoteShoppingItem;

/// Remote store contract consumed by the sync engine.
///
/// The engine takes this as an injected dependency, so tests can stand
/// in an in-memory implementation with failure injection.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches the full remote item set.
    async fn fetch_all(&self) -> Result<Vec<RemoteShoppingItem>, ApiError>;

    /// Creates a record on the server.
    async fn create_item(&self, item: &RemoteShoppingItem)
        -> Result<RemoteShoppingItem, ApiError>;

    /// Full upsert of an existing record by id.
    async fn update_item(&self, item: &RemoteShoppingItem)
        -> Result<RemoteShoppingItem, ApiError>;

    /// Deletes a record by id. An id already absent remotely surfaces as
    /// `ApiError::NotFound`.
    async fn delete_item(&self, id: &str) -> Result<(), ApiError>;
}

/// `RemoteStore` over HTTP, using a shared connection pool.
pub struct HttpRemoteStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemoteStore {
    /// Creates a client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Returns the server base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn items_url(&self) -> String {
        format!("{}/api/shopping-items", self.base_url)
    }

    fn item_url(&self, id: &str) -> String {
        format!("{}/api/shopping-items/{}", self.base_url, id)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch_all(&self) -> Result<Vec<RemoteShoppingItem>, ApiError> {
        let response = self.client.get(self.items_url()).send().await?;
        let response = Self::check_status(response).await?;
        let items = response.json().await?;
        Ok(items)
    }

    async fn create_item(
        &self,
        item: &RemoteShoppingItem,
    ) -> Result<RemoteShoppingItem, ApiError> {
        let response = self.client.post(self.items_url()).json(item).send().await?;
        let response = Self::check_status(response).await?;
        let created = response.json().await?;
        Ok(created)
    }

    async fn update_item(
        &self,
        item: &RemoteShoppingItem,
    ) -> Result<RemoteShoppingItem, ApiError> {
        let response = self
            .client
            .put(self.item_url(&item.id))
            .json(item)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let updated = response.json().await?;
        Ok(updated)
    }

    async fn delete_item(&self, id: &str) -> Result<(), ApiError> {
        let response = self.client.delete(self.item_url(id)).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }
}
