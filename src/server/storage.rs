//! In-memory item storage for the reference server.
//!
//! The authoritative store's persistence is out of scope; the reference
//! server exists for development and for end-to-end tests of the client.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::models::RemoteShoppingItem;

/// Server-side item store, keyed by id.
#[derive(Default)]
pub struct ServerStorage {
    items: RwLock<HashMap<String, RemoteShoppingItem>>,
}

impl ServerStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// All items, oldest first.
    pub async fn list(&self) -> Vec<RemoteShoppingItem> {
        let items = self.items.read().await;
        let mut all: Vec<RemoteShoppingItem> = items.values().cloned().collect();
        all.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        all
    }

    /// Insert-or-replace. A retried create after a lost response must
    /// converge on the same record instead of failing forever.
    pub async fn upsert(&self, item: RemoteShoppingItem) -> RemoteShoppingItem {
        let mut items = self.items.write().await;
        items.insert(item.id.clone(), item.clone());
        item
    }

    /// Replaces an existing record. Returns `None` if the id is absent.
    pub async fn update(
        &self,
        id: &str,
        item: RemoteShoppingItem,
    ) -> Option<RemoteShoppingItem> {
        let mut items = self.items.write().await;
        if !items.contains_key(id) {
            return None;
        }
        items.insert(id.to_string(), item.clone());
        Some(item)
    }

    /// Removes a record. Returns whether it existed.
    pub async fn remove(&self, id: &str) -> bool {
        self.items.write().await.remove(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::timestamp;
    use chrono::Duration;

    fn item(id: &str, name: &str) -> RemoteShoppingItem {
        RemoteShoppingItem {
            id: id.to_string(),
            name: name.to_string(),
            quantity: 1,
            note: None,
            is_purchased: false,
            created_at: timestamp::now(),
            updated_at: timestamp::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_list() {
        let storage = ServerStorage::new();

        let mut early = item("a", "Milk");
        early.created_at = timestamp::now() - Duration::seconds(60);
        storage.upsert(item("b", "Bread")).await;
        storage.upsert(early).await;

        let all = storage.list().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "a");
        assert_eq!(all[1].id, "b");
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing() {
        let storage = ServerStorage::new();

        storage.upsert(item("a", "Milk")).await;
        storage.upsert(item("a", "Oat milk")).await;

        let all = storage.list().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Oat milk");
    }

    #[tokio::test]
    async fn test_update_requires_existing_id() {
        let storage = ServerStorage::new();

        assert!(storage.update("a", item("a", "Milk")).await.is_none());

        storage.upsert(item("a", "Milk")).await;
        let updated = storage.update("a", item("a", "Whole milk")).await;
        assert_eq!(updated.unwrap().name, "Whole milk");
    }

    #[tokio::test]
    async fn test_remove() {
        let storage = ServerStorage::new();

        storage.upsert(item("a", "Milk")).await;
        assert!(storage.remove("a").await);
        assert!(!storage.remove("a").await);
        assert!(storage.list().await.is_empty());
    }
}
