//! Process-local persistence, used for ephemeral stores and tests.

use std::sync::Mutex;

use async_trait::async_trait;

use super::RecordPersistence;
use crate::models::InventoryItem;
use crate::{Error, Result};

/// Keeps the last saved snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    saved: Mutex<Option<Vec<InventoryItem>>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an already-saved snapshot.
    pub fn with_records(items: Vec<InventoryItem>) -> Self {
        Self {
            saved: Mutex::new(Some(items)),
        }
    }

    /// The last saved snapshot, if any.
    pub fn snapshot(&self) -> Option<Vec<InventoryItem>> {
        self.saved.lock().ok().and_then(|saved| saved.clone())
    }
}

#[async_trait]
impl RecordPersistence for MemoryPersistence {
    async fn load_records(&self) -> Result<Option<Vec<InventoryItem>>> {
        let saved = self
            .saved
            .lock()
            .map_err(|error| Error::Database(error.to_string()))?;
        Ok(saved.clone())
    }

    async fn save_records(&self, items: &[InventoryItem]) -> Result<()> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|error| Error::Database(error.to_string()))?;
        *saved = Some(items.to_vec());
        Ok(())
    }
}
