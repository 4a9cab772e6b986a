//! libSQL database handle for the on-device inventory.

use std::path::Path;

use libsql::{Builder, Connection};

use super::migrations;
use crate::error::Result;

/// WAL is refused by in-memory databases; failures are ignored.
const PRAGMAS: &[&str] = &["PRAGMA journal_mode = WAL", "PRAGMA synchronous = NORMAL"];

/// An open, migrated local database.
pub struct Database {
    // the connection is only valid while its database lives
    _db: libsql::Database,
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file at `path`, including missing parent
    /// directories, and bring its schema up to date.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        tracing::debug!(path = %path.display(), "Opening inventory database");
        Self::connect(Builder::new_local(path).build().await?).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        Self::connect(Builder::new_local(":memory:").build().await?).await
    }

    async fn connect(db: libsql::Database) -> Result<Self> {
        let conn = db.connect()?;
        for pragma in PRAGMAS {
            if let Err(error) = conn.execute(pragma, ()).await {
                tracing::debug!("{pragma} not applied: {error}");
            }
        }
        migrations::run(&conn).await?;
        Ok(Self { _db: db, conn })
    }

    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}
