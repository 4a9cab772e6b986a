//! JSON file persistence with atomic replace-on-save.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use super::RecordPersistence;
use crate::models::InventoryItem;
use crate::Result;

/// Stores the inventory as a pretty-printed JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl RecordPersistence for JsonFilePersistence {
    async fn load_records(&self) -> Result<Option<Vec<InventoryItem>>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        let items = serde_json::from_slice::<Vec<InventoryItem>>(&raw)?;
        Ok(Some(items))
    }

    async fn save_records(&self, items: &[InventoryItem]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let serialized = serde_json::to_vec_pretty(items)?;
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, serialized).await?;
        // rename is atomic on the same filesystem, readers never see a partial file
        tokio::fs::rename(&temp_path, &self.path).await?;

        tracing::debug!(
            "Saved {} inventory items to {}",
            items.len(),
            self.path.display()
        );
        Ok(())
    }
}
