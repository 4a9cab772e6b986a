//! Inventory item model

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{FoodCategory, ItemTag};

/// A unique identifier for an inventory item, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Create a new unique item ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A perishable item tracked in the inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Unique identifier, assigned once at creation
    pub id: ItemId,
    /// Display name
    pub name: String,
    /// Food category
    pub category: FoodCategory,
    /// Descriptive tags
    #[serde(default)]
    pub tags: BTreeSet<ItemTag>,
    /// Expiration timestamp (Unix ms)
    pub expires_at: i64,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Optional free-text note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl InventoryItem {
    /// Create a new item expiring at `expires_at` (Unix ms)
    #[must_use]
    pub fn new(name: impl Into<String>, category: FoodCategory, expires_at: i64) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            category,
            tags: BTreeSet::new(),
            expires_at,
            created_at: chrono::Utc::now().timestamp_millis(),
            note: None,
        }
    }

    /// Builder-style helper to attach a tag
    #[must_use]
    pub fn with_tag(mut self, tag: ItemTag) -> Self {
        self.tags.insert(tag);
        self
    }

    /// Builder-style helper to attach a note
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Whether the item has expired at `now_ms`
    #[must_use]
    pub const fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at <= now_ms
    }

    /// Whether the item expires within `window_ms` of `now_ms` (and has not expired yet)
    #[must_use]
    pub const fn expires_within(&self, now_ms: i64, window_ms: i64) -> bool {
        !self.is_expired(now_ms) && self.expires_at <= now_ms.saturating_add(window_ms)
    }
}
