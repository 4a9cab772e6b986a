//! Durable storage backends for the local inventory.
//!
//! The local store only needs two operations from its backing storage: read
//! the last saved record array, and replace it wholesale. Backends must make
//! `save_records` atomic from the caller's point of view.

mod json_file;
mod memory;

pub use json_file::JsonFilePersistence;
pub use memory::MemoryPersistence;

use async_trait::async_trait;

use crate::models::InventoryItem;
use crate::Result;

/// Opaque durable storage for the inventory record array.
#[async_trait]
pub trait RecordPersistence: Send + Sync {
    /// Load the persisted records.
    ///
    /// Returns `Ok(None)` when nothing has ever been saved (first run).
    async fn load_records(&self) -> Result<Option<Vec<InventoryItem>>>;

    /// Replace the persisted records with `items`.
    async fn save_records(&self, items: &[InventoryItem]) -> Result<()>;
}
