//! Per-user remote inventory collection.
//!
//! [`RemoteDatabase`] is the raw backend seam (Supabase PostgREST in
//! production, an in-memory table in tests). [`RemoteStoreClient`] layers the
//! signed-in user on top of it: every call resolves the current session first
//! and fails with [`RemoteError::Unauthenticated`] when there is none. No call
//! is retried internally.

mod memory;
mod rest;

pub use memory::{MemoryRemoteDatabase, RemoteCallCounts};
pub use rest::RestRemoteDatabase;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AuthTracker;
use crate::models::{InventoryItem, ItemId};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Not signed in")]
    Unauthenticated,
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),
    #[error("Remote HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Remote API error: {0}")]
    Api(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// A stored inventory item as the remote sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub user_id: String,
    #[serde(flatten)]
    pub item: InventoryItem,
    /// Assigned by the server on every write
    pub updated_at: DateTime<Utc>,
}

/// Credentials and owner for one remote call.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteScope {
    pub user_id: String,
    pub access_token: String,
}

impl std::fmt::Debug for RemoteScope {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RemoteScope")
            .field("user_id", &self.user_id)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
pub trait RemoteDatabase: Send + Sync {
    /// Insert or overwrite each item keyed by id.
    async fn upsert(&self, scope: &RemoteScope, items: &[InventoryItem]) -> RemoteResult<()>;

    /// Every record owned by the scope's user.
    async fn fetch_all(&self, scope: &RemoteScope) -> RemoteResult<Vec<RemoteRecord>>;

    /// Delete one record. Deleting a missing record succeeds.
    async fn delete(&self, scope: &RemoteScope, id: &ItemId) -> RemoteResult<()>;

    /// Delete every record owned by the scope's user, returning how many went.
    async fn delete_all(&self, scope: &RemoteScope) -> RemoteResult<usize>;
}

/// Authenticated access to the current user's remote inventory.
#[derive(Clone)]
pub struct RemoteStoreClient {
    database: Arc<dyn RemoteDatabase>,
    auth: Arc<AuthTracker>,
}

impl RemoteStoreClient {
    pub fn new(database: Arc<dyn RemoteDatabase>, auth: Arc<AuthTracker>) -> Self {
        Self { database, auth }
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    /// Upsert every item. Safe to repeat with the same input.
    pub async fn upload(&self, items: &[InventoryItem]) -> RemoteResult<()> {
        let scope = self.scope()?;
        if items.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = items.len(), "Uploading items");
        self.database.upsert(&scope, items).await
    }

    /// All remote items for the signed-in user; empty when there are none.
    pub async fn fetch(&self) -> RemoteResult<Vec<InventoryItem>> {
        Ok(self
            .fetch_records()
            .await?
            .into_iter()
            .map(|record| record.item)
            .collect())
    }

    pub async fn fetch_records(&self) -> RemoteResult<Vec<RemoteRecord>> {
        let scope = self.scope()?;
        let records = self.database.fetch_all(&scope).await?;
        tracing::debug!(count = records.len(), "Fetched remote records");
        Ok(records)
    }

    pub async fn delete(&self, id: &ItemId) -> RemoteResult<()> {
        let scope = self.scope()?;
        self.database.delete(&scope, id).await
    }

    /// Delete remote records whose id is not in `local_ids`.
    ///
    /// Ids present locally are never deleted. Returns the deleted ids in
    /// remote order.
    pub async fn sync_deletions(&self, local_ids: &HashSet<ItemId>) -> RemoteResult<Vec<ItemId>> {
        let scope = self.scope()?;
        let remote = self.database.fetch_all(&scope).await?;

        let mut deleted = Vec::new();
        for record in remote {
            let id = record.item.id;
            if local_ids.contains(&id) || deleted.contains(&id) {
                continue;
            }
            self.database.delete(&scope, &id).await?;
            deleted.push(id);
        }

        if !deleted.is_empty() {
            tracing::info!(count = deleted.len(), "Deleted remote-only records");
        }
        Ok(deleted)
    }

    /// Remove every remote record for the signed-in user.
    pub async fn delete_all(&self) -> RemoteResult<usize> {
        let scope = self.scope()?;
        let count = self.database.delete_all(&scope).await?;
        tracing::info!(count, "Deleted all remote records");
        Ok(count)
    }

    fn scope(&self) -> RemoteResult<RemoteScope> {
        let session = self
            .auth
            .current_session()
            .ok_or(RemoteError::Unauthenticated)?;
        Ok(RemoteScope {
            user_id: session.user.id,
            access_token: session.access_token,
        })
    }
}
