//! Pure, I/O-free views over an inventory snapshot.

use std::cmp::Ordering;

use crate::models::{FoodCategory, InventoryItem, ItemTag};

/// Expiration constraint for [`ItemFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryWindow {
    /// Already expired at the reference time
    Expired,
    /// Not yet expired, but expiring within the given number of milliseconds
    Within(i64),
}

/// Conjunctive filter over inventory items. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub category: Option<FoodCategory>,
    pub tag: Option<ItemTag>,
    pub expiry: Option<ExpiryWindow>,
    /// Case-insensitive substring match on the item name
    pub query: Option<String>,
}

impl ItemFilter {
    #[must_use]
    pub fn category(category: FoodCategory) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn tag(tag: ItemTag) -> Self {
        Self {
            tag: Some(tag),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn expiring_within(window_ms: i64) -> Self {
        Self {
            expiry: Some(ExpiryWindow::Within(window_ms)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn expired() -> Self {
        Self {
            expiry: Some(ExpiryWindow::Expired),
            ..Self::default()
        }
    }

    /// Check whether `item` passes every configured constraint at `now_ms`
    #[must_use]
    pub fn matches(&self, item: &InventoryItem, now_ms: i64) -> bool {
        if self.category.is_some_and(|category| item.category != category) {
            return false;
        }
        if self.tag.is_some_and(|tag| !item.tags.contains(&tag)) {
            return false;
        }
        let expiry_ok = match self.expiry {
            None => true,
            Some(ExpiryWindow::Expired) => item.is_expired(now_ms),
            Some(ExpiryWindow::Within(window_ms)) => item.expires_within(now_ms, window_ms),
        };
        if !expiry_ok {
            return false;
        }
        self.query.as_deref().map_or(true, |query| {
            let query = query.trim().to_lowercase();
            query.is_empty() || item.name.to_lowercase().contains(&query)
        })
    }
}

/// Sort orders offered by list views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemSort {
    /// Soonest expiry first
    #[default]
    ExpiresSoonest,
    /// Most recently created first
    NewestFirst,
    /// Alphabetical by name (case-insensitive)
    Name,
}

/// Sort `items` in place. Ties fall back to the item id so output is stable.
pub fn sort_items(items: &mut [InventoryItem], sort: ItemSort) {
    items.sort_by(|a, b| {
        let primary = match sort {
            ItemSort::ExpiresSoonest => a.expires_at.cmp(&b.expires_at),
            ItemSort::NewestFirst => b.created_at.cmp(&a.created_at),
            ItemSort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        };
        match primary {
            Ordering::Equal => a.id.cmp(&b.id),
            other => other,
        }
    });
}
