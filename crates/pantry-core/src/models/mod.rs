//! Data models for Pantry

mod category;
mod item;

pub use category::{FoodCategory, ItemTag};
pub use item::{InventoryItem, ItemId};
