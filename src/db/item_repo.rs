//! SQLite repository for shopping list items.
//!
//! All writes are single statements, so the store's own atomicity covers
//! each one; the sync engine never needs a cross-statement transaction.
//! Every committed write broadcasts one change signal.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::broadcast;

use crate::models::{timestamp, RemoteShoppingItem, ShoppingItem};

/// Capacity of the change-notification channel. A lagging subscriber
/// just coalesces the missed signals into one extra wakeup.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: String,
    name: String,
    quantity: i64,
    note: Option<String>,
    is_purchased: bool,
    created_at: String,
    updated_at: String,
    needs_sync: bool,
    is_deleted_locally: bool,
}

impl ItemRow {
    fn into_item(self) -> ShoppingItem {
        ShoppingItem {
            id: self.id,
            name: self.name,
            quantity: self.quantity,
            note: self.note,
            is_purchased: self.is_purchased,
            created_at: parse_stored(&self.created_at),
            updated_at: parse_stored(&self.updated_at),
            needs_sync: self.needs_sync,
            is_deleted_locally: self.is_deleted_locally,
        }
    }
}

fn parse_stored(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Repository over the local shopping_items table.
///
/// Clones share the same pool and the same change channel, so the
/// user-facing write path and the sync engine observe each other's
/// writes and signals.
#[derive(Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
    changes: broadcast::Sender<()>,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { pool, changes }
    }

    /// Subscribe to change notifications. One signal per committed
    /// write, including writes made by the sync engine itself.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.changes.subscribe()
    }

    fn notify(&self) {
        // Nobody listening yet is fine
        let _ = self.changes.send(());
    }

    /// Lists items, newest last. Tombstoned records are excluded from
    /// user-facing reads; the sync engine passes `true` to see them.
    pub async fn list_all(
        &self,
        include_soft_deleted: bool,
    ) -> Result<Vec<ShoppingItem>, sqlx::Error> {
        let query = if include_soft_deleted {
            "SELECT * FROM shopping_items ORDER BY created_at, id"
        } else {
            "SELECT * FROM shopping_items WHERE is_deleted_locally = 0 ORDER BY created_at, id"
        };
        let rows: Vec<ItemRow> = sqlx::query_as(query).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(ItemRow::into_item).collect())
    }

    pub async fn get(&self, id: &str) -> Result<Option<ShoppingItem>, sqlx::Error> {
        let row: Option<ItemRow> = sqlx::query_as("SELECT * FROM shopping_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ItemRow::into_item))
    }

    /// Creates a new item pending its first sync.
    pub async fn create(
        &self,
        name: &str,
        quantity: i64,
        note: Option<&str>,
    ) -> Result<ShoppingItem, sqlx::Error> {
        let item = ShoppingItem::new(name, quantity, note.map(str::to_owned));

        sqlx::query(
            r#"
            INSERT INTO shopping_items
                (id, name, quantity, note, is_purchased, created_at, updated_at, needs_sync, is_deleted_locally)
            VALUES (?, ?, ?, ?, ?, ?, ?, 1, 0)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(&item.note)
        .bind(item.is_purchased)
        .bind(item.created_at.to_rfc3339())
        .bind(item.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.notify();
        Ok(item)
    }

    /// Scoped update of the user-editable fields. Bumps `updated_at` and
    /// marks the record dirty.
    pub async fn update_fields(
        &self,
        id: &str,
        name: &str,
        quantity: i64,
        note: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        let updated_at = timestamp::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            UPDATE shopping_items
            SET name = ?, quantity = ?, note = ?, updated_at = ?, needs_sync = 1
            WHERE id = ? AND is_deleted_locally = 0
            "#,
        )
        .bind(name)
        .bind(quantity)
        .bind(note)
        .bind(&updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        self.notify();
        Ok(())
    }

    /// Flips the purchased flag. Counts as a mutation: bumps
    /// `updated_at` and marks the record dirty.
    pub async fn toggle_purchased(&self, id: &str) -> Result<(), sqlx::Error> {
        let updated_at = timestamp::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            UPDATE shopping_items
            SET is_purchased = NOT is_purchased, updated_at = ?, needs_sync = 1
            WHERE id = ? AND is_deleted_locally = 0
            "#,
        )
        .bind(&updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        self.notify();
        Ok(())
    }

    /// Soft delete: sets the tombstone. The row stays until the sync
    /// engine has propagated the deletion and hard-deletes it.
    pub async fn soft_delete(&self, id: &str) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            "UPDATE shopping_items SET is_deleted_locally = 1, needs_sync = 1 WHERE id = ?",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        self.notify();
        Ok(())
    }

    /// Hard delete. Engine-only: called once the remote delete attempt
    /// has been made.
    pub async fn hard_delete(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM shopping_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.notify();
        Ok(())
    }

    /// Clears the dirty flag once the server has confirmed the record.
    pub async fn mark_synced(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE shopping_items SET needs_sync = 0 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.notify();
        Ok(())
    }

    /// Create-or-replace from the server copy, in one statement. Clears
    /// both flags; the result is by definition in sync with the remote.
    pub async fn apply_remote(&self, remote: &RemoteShoppingItem) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO shopping_items
                (id, name, quantity, note, is_purchased, created_at, updated_at, needs_sync, is_deleted_locally)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, 0)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                quantity = excluded.quantity,
                note = excluded.note,
                is_purchased = excluded.is_purchased,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at,
                needs_sync = 0,
                is_deleted_locally = 0
            "#,
        )
        .bind(&remote.id)
        .bind(&remote.name)
        .bind(remote.quantity)
        .bind(&remote.note)
        .bind(remote.is_purchased)
        .bind(remote.created_at.to_rfc3339())
        .bind(remote.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.notify();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, ItemRepository) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        (temp_dir, ItemRepository::new(pool))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_tmp, repo) = setup().await;

        let item = repo.create("Eggs", 12, Some("free range")).await.unwrap();
        let loaded = repo.get(&item.id).await.unwrap().unwrap();

        assert_eq!(loaded.name, "Eggs");
        assert_eq!(loaded.quantity, 12);
        assert_eq!(loaded.note.as_deref(), Some("free range"));
        assert!(loaded.needs_sync);
        assert!(!loaded.is_deleted_locally);
        assert_eq!(loaded.created_at, item.created_at);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name_and_bad_quantity() {
        let (_tmp, repo) = setup().await;

        assert!(repo.create("", 1, None).await.is_err());
        assert!(repo.create("Milk", 0, None).await.is_err());
        assert!(repo.create("Milk", -3, None).await.is_err());
    }

    #[tokio::test]
    async fn test_list_all_filters_tombstones() {
        let (_tmp, repo) = setup().await;

        let keep = repo.create("Milk", 1, None).await.unwrap();
        let gone = repo.create("Bread", 1, None).await.unwrap();
        repo.soft_delete(&gone.id).await.unwrap();

        let visible = repo.list_all(false).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, keep.id);

        let everything = repo.list_all(true).await.unwrap();
        assert_eq!(everything.len(), 2);
        let tombstoned = everything.iter().find(|i| i.id == gone.id).unwrap();
        assert!(tombstoned.is_deleted_locally);
        assert!(tombstoned.needs_sync);
    }

    #[tokio::test]
    async fn test_update_fields_marks_dirty() {
        let (_tmp, repo) = setup().await;

        let item = repo.create("Milk", 1, None).await.unwrap();
        repo.mark_synced(&item.id).await.unwrap();

        repo.update_fields(&item.id, "Oat milk", 2, Some("barista"))
            .await
            .unwrap();

        let loaded = repo.get(&item.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Oat milk");
        assert_eq!(loaded.quantity, 2);
        assert_eq!(loaded.note.as_deref(), Some("barista"));
        assert!(loaded.needs_sync);
        assert!(loaded.updated_at >= item.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_item_is_not_found() {
        let (_tmp, repo) = setup().await;

        let err = repo.update_fields("no-such-id", "x", 1, None).await;
        assert!(matches!(err, Err(sqlx::Error::RowNotFound)));
    }

    #[tokio::test]
    async fn test_toggle_purchased() {
        let (_tmp, repo) = setup().await;

        let item = repo.create("Milk", 1, None).await.unwrap();
        repo.mark_synced(&item.id).await.unwrap();

        repo.toggle_purchased(&item.id).await.unwrap();
        let loaded = repo.get(&item.id).await.unwrap().unwrap();
        assert!(loaded.is_purchased);
        assert!(loaded.needs_sync);

        repo.toggle_purchased(&item.id).await.unwrap();
        let loaded = repo.get(&item.id).await.unwrap().unwrap();
        assert!(!loaded.is_purchased);
    }

    #[tokio::test]
    async fn test_hard_delete_removes_row() {
        let (_tmp, repo) = setup().await;

        let item = repo.create("Milk", 1, None).await.unwrap();
        repo.hard_delete(&item.id).await.unwrap();

        assert!(repo.get(&item.id).await.unwrap().is_none());
        // Deleting an absent row is a no-op, not an error
        repo.hard_delete(&item.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_apply_remote_upserts_and_clears_flags() {
        let (_tmp, repo) = setup().await;

        let item = repo.create("Milk", 1, None).await.unwrap();
        let mut remote = RemoteShoppingItem::from(&item);
        remote.name = "Whole milk".to_string();
        remote.is_purchased = true;

        repo.apply_remote(&remote).await.unwrap();
        let loaded = repo.get(&item.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Whole milk");
        assert!(loaded.is_purchased);
        assert!(!loaded.needs_sync);
        assert!(!loaded.is_deleted_locally);

        // Absent id inserts
        remote.id = "remote-only".to_string();
        repo.apply_remote(&remote).await.unwrap();
        let pulled = repo.get("remote-only").await.unwrap().unwrap();
        assert!(!pulled.needs_sync);
    }

    #[tokio::test]
    async fn test_apply_remote_clears_tombstone() {
        let (_tmp, repo) = setup().await;

        let item = repo.create("Milk", 1, None).await.unwrap();
        repo.soft_delete(&item.id).await.unwrap();

        let remote = RemoteShoppingItem::from(&item);
        repo.apply_remote(&remote).await.unwrap();

        let loaded = repo.get(&item.id).await.unwrap().unwrap();
        assert!(!loaded.is_deleted_locally);
        assert!(!loaded.needs_sync);
    }

    #[tokio::test]
    async fn test_writes_broadcast_change_signals() {
        let (_tmp, repo) = setup().await;
        let mut rx = repo.subscribe();

        let item = repo.create("Milk", 1, None).await.unwrap();
        assert!(rx.try_recv().is_ok());

        repo.toggle_purchased(&item.id).await.unwrap();
        repo.soft_delete(&item.id).await.unwrap();
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_timestamps_round_trip_through_storage() {
        let (_tmp, repo) = setup().await;

        let item = repo.create("Milk", 1, None).await.unwrap();
        let loaded = repo.get(&item.id).await.unwrap().unwrap();

        assert_eq!(loaded.created_at, item.created_at);
        assert_eq!(loaded.updated_at, item.updated_at);
    }
}
