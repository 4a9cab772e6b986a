//! libSQL implementation of `RecordPersistence`

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;
use libsql::{Connection, Row, Value};
use tokio::sync::Mutex;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{InventoryItem, ItemTag};
use crate::persistence::RecordPersistence;

const LAST_SAVED_KEY: &str = "last_saved_at";

/// Persists the full inventory snapshot into the `inventory_items` table.
///
/// Every save replaces the table contents inside one transaction.
pub struct LibSqlRecordPersistence {
    db: Mutex<Database>,
}

impl LibSqlRecordPersistence {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Open (or create) the database file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Database::open(path).await?))
    }

    /// Throwaway in-memory store.
    pub async fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory().await?))
    }

    async fn has_snapshot(conn: &Connection) -> Result<bool> {
        let mut rows = conn
            .query("SELECT value FROM store_meta WHERE key = ?", [LAST_SAVED_KEY])
            .await?;
        Ok(rows.next().await?.is_some())
    }

    async fn replace_all(conn: &Connection, items: &[InventoryItem]) -> Result<()> {
        conn.execute("DELETE FROM inventory_items", ()).await?;

        for (position, item) in items.iter().enumerate() {
            let tags = serde_json::to_string(&item.tags)?;
            let position = i64::try_from(position)
                .map_err(|_| Error::InvalidInput("inventory too large".to_string()))?;
            let params = vec![
                Value::Text(item.id.as_str()),
                Value::Integer(position),
                Value::Text(item.name.clone()),
                Value::Text(item.category.as_str().to_string()),
                Value::Text(tags),
                Value::Integer(item.expires_at),
                Value::Integer(item.created_at),
                item.note.clone().map_or(Value::Null, Value::Text),
            ];
            conn.execute(
                "INSERT INTO inventory_items
                    (id, position, name, category, tags, expires_at, created_at, note)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params,
            )
            .await?;
        }

        let saved_at = chrono::Utc::now().timestamp_millis().to_string();
        conn.execute(
            "INSERT OR REPLACE INTO store_meta (key, value) VALUES (?, ?)",
            [LAST_SAVED_KEY, saved_at.as_str()],
        )
        .await?;
        Ok(())
    }

    /// Parse an item from a database row
    fn parse_item(row: &Row) -> Result<InventoryItem> {
        let id: String = row.get(0)?;
        let category: String = row.get(2)?;
        let tags: String = row.get(3)?;
        let note = match row.get_value(6)? {
            Value::Text(note) => Some(note),
            _ => None,
        };

        Ok(InventoryItem {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("invalid item id '{id}'")))?,
            name: row.get(1)?,
            category: category.parse().map_err(Error::Database)?,
            tags: serde_json::from_str::<BTreeSet<ItemTag>>(&tags)?,
            expires_at: row.get(4)?,
            created_at: row.get(5)?,
            note,
        })
    }
}

#[async_trait]
impl RecordPersistence for LibSqlRecordPersistence {
    async fn load_records(&self) -> Result<Option<Vec<InventoryItem>>> {
        let db = self.db.lock().await;
        let conn = db.connection();

        if !Self::has_snapshot(conn).await? {
            return Ok(None);
        }

        let mut rows = conn
            .query(
                "SELECT id, name, category, tags, expires_at, created_at, note
                 FROM inventory_items
                 ORDER BY position ASC",
                (),
            )
            .await?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(Self::parse_item(&row)?);
        }
        Ok(Some(items))
    }

    async fn save_records(&self, items: &[InventoryItem]) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        conn.execute("BEGIN TRANSACTION", ()).await?;

        if let Err(e) = Self::replace_all(conn, items).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e);
        }

        if let Err(e) = conn.execute("COMMIT", ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }

        tracing::debug!("Saved {} inventory items to libSQL", items.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::FoodCategory;

    fn sample_items() -> Vec<InventoryItem> {
        vec![
            InventoryItem::new("Eggs", FoodCategory::Dairy, 5_000)
                .with_tag(ItemTag::Refrigerated)
                .with_tag(ItemTag::Organic),
            InventoryItem::new("Sourdough", FoodCategory::Bakery, 3_000).with_note("half loaf"),
            InventoryItem::new("Peas", FoodCategory::Frozen, 90_000),
        ]
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fresh_database_has_no_snapshot() {
        let persistence = LibSqlRecordPersistence::open_in_memory().await.unwrap();
        assert!(persistence.load_records().await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn save_then_load_preserves_order_and_fields() {
        let persistence = LibSqlRecordPersistence::open_in_memory().await.unwrap();
        let items = sample_items();

        persistence.save_records(&items).await.unwrap();
        let loaded = persistence.load_records().await.unwrap().unwrap();

        assert_eq!(loaded, items);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn saving_empty_snapshot_is_distinct_from_never_saved() {
        let persistence = LibSqlRecordPersistence::open_in_memory().await.unwrap();

        persistence.save_records(&sample_items()).await.unwrap();
        persistence.save_records(&[]).await.unwrap();

        assert_eq!(persistence.load_records().await.unwrap(), Some(Vec::new()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reopening_file_restores_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("pantry.db");
        let items = sample_items();

        {
            let persistence = LibSqlRecordPersistence::open(&path).await.unwrap();
            persistence.save_records(&items).await.unwrap();
        }

        let reopened = LibSqlRecordPersistence::open(&path).await.unwrap();
        assert_eq!(reopened.load_records().await.unwrap(), Some(items));
    }
}
