//! Shopping list item models.
//!
//! `ShoppingItem` is the on-device representation; it carries the two
//! local-only sync flags. `RemoteShoppingItem` is the server's wire shape.
//! The two are isomorphic apart from those flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::timestamp;

/// A shopping list entry as stored on-device.
#[derive(Debug, Clone, PartialEq)]
pub struct ShoppingItem {
    /// Globally unique, assigned at local creation, never reassigned
    pub id: String,
    pub name: String,
    pub quantity: i64,
    pub note: Option<String>,
    pub is_purchased: bool,
    /// Set once at creation, immutable thereafter
    pub created_at: DateTime<Utc>,
    /// Bumped on every mutation, including purchase-toggle
    pub updated_at: DateTime<Utc>,
    /// Local copy has mutations not yet confirmed on the server
    pub needs_sync: bool,
    /// Tombstone: deleted locally, deletion not yet propagated
    pub is_deleted_locally: bool,
}

impl ShoppingItem {
    /// Creates a new item pending its first sync.
    pub fn new(name: impl Into<String>, quantity: i64, note: Option<String>) -> Self {
        let now = timestamp::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            quantity,
            note,
            is_purchased: false,
            created_at: now,
            updated_at: now,
            needs_sync: true,
            is_deleted_locally: false,
        }
    }
}

impl fmt::Display for ShoppingItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let check = if self.is_purchased { "[x]" } else { "[ ]" };
        write!(f, "{} {:<20} x{}", check, self.name, self.quantity)?;
        if let Some(note) = &self.note {
            write!(f, " ({})", note)?;
        }
        Ok(())
    }
}

/// A shopping list entry as the server represents it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteShoppingItem {
    pub id: String,
    pub name: String,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub is_purchased: bool,
    #[serde(with = "timestamp::wire")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp::wire")]
    pub updated_at: DateTime<Utc>,
}

impl From<&ShoppingItem> for RemoteShoppingItem {
    fn from(item: &ShoppingItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            note: item.note.clone(),
            is_purchased: item.is_purchased,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

impl RemoteShoppingItem {
    /// Materializes the server copy as a local record that is, by
    /// definition, in sync.
    pub fn into_local(self) -> ShoppingItem {
        ShoppingItem {
            id: self.id,
            name: self.name,
            quantity: self.quantity,
            note: self.note,
            is_purchased: self.is_purchased,
            created_at: self.created_at,
            updated_at: self.updated_at,
            needs_sync: false,
            is_deleted_locally: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_remote() -> RemoteShoppingItem {
        RemoteShoppingItem {
            id: "item-1".to_string(),
            name: "Eggs".to_string(),
            quantity: 12,
            note: Some("free range".to_string()),
            is_purchased: false,
            created_at: Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2026, 8, 7, 14, 3, 21).unwrap(),
        }
    }

    #[test]
    fn test_new_item_flags() {
        let item = ShoppingItem::new("Milk", 2, None);
        assert!(!item.id.is_empty());
        assert!(item.needs_sync);
        assert!(!item.is_deleted_locally);
        assert!(!item.is_purchased);
        assert_eq!(item.created_at, item.updated_at);
    }

    #[test]
    fn test_new_items_get_distinct_ids() {
        let a = ShoppingItem::new("Milk", 1, None);
        let b = ShoppingItem::new("Milk", 1, None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_display() {
        let mut item = ShoppingItem::new("Milk", 2, Some("oat".to_string()));
        assert_eq!(format!("{}", item), format!("[ ] {:<20} x2 (oat)", "Milk"));

        item.is_purchased = true;
        item.note = None;
        assert_eq!(format!("{}", item), format!("[x] {:<20} x2", "Milk"));
    }

    #[test]
    fn test_remote_serializes_with_camel_case_and_wire_dates() {
        let json = serde_json::to_value(sample_remote()).unwrap();
        assert_eq!(json["id"], "item-1");
        assert_eq!(json["isPurchased"], false);
        assert_eq!(json["createdAt"], "2026-08-01T09:00:00+0000");
        assert_eq!(json["updatedAt"], "2026-08-07T14:03:21+0000");
    }

    #[test]
    fn test_remote_omits_missing_note() {
        let mut remote = sample_remote();
        remote.note = None;
        let json = serde_json::to_value(remote).unwrap();
        assert!(json.get("note").is_none());
    }

    #[test]
    fn test_remote_deserializes_without_note() {
        let raw = r#"{
            "id": "item-2",
            "name": "Bread",
            "quantity": 1,
            "isPurchased": true,
            "createdAt": "2026-08-01T09:00:00+0000",
            "updatedAt": "2026-08-02T10:30:00+0000"
        }"#;
        let remote: RemoteShoppingItem = serde_json::from_str(raw).unwrap();
        assert_eq!(remote.name, "Bread");
        assert!(remote.note.is_none());
        assert!(remote.is_purchased);
    }

    #[test]
    fn test_remote_json_round_trip() {
        let remote = sample_remote();
        let json = serde_json::to_string(&remote).unwrap();
        let parsed: RemoteShoppingItem = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, remote);
    }

    #[test]
    fn test_local_remote_conversion() {
        let item = ShoppingItem::new("Butter", 1, Some("salted".to_string()));
        let remote = RemoteShoppingItem::from(&item);
        assert_eq!(remote.id, item.id);
        assert_eq!(remote.updated_at, item.updated_at);

        let back = remote.into_local();
        assert!(!back.needs_sync);
        assert!(!back.is_deleted_locally);
        assert_eq!(back.name, item.name);
        assert_eq!(back.created_at, item.created_at);
    }
}
