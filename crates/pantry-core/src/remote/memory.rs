//! In-process remote backend with call accounting.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;

use super::{RemoteDatabase, RemoteError, RemoteRecord, RemoteResult, RemoteScope};
use crate::models::{InventoryItem, ItemId};

/// Number of backend calls observed, by operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteCallCounts {
    pub upserts: usize,
    pub fetches: usize,
    pub deletes: usize,
    pub delete_alls: usize,
}

impl RemoteCallCounts {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.upserts + self.fetches + self.deletes + self.delete_alls
    }
}

/// Remote table kept in memory, one ordered record list per user.
///
/// Calls are counted as soon as they arrive. While the gate is closed every
/// call waits before touching the table, which lets callers observe a request
/// that is still in flight.
pub struct MemoryRemoteDatabase {
    tables: Mutex<HashMap<String, Vec<RemoteRecord>>>,
    upserts: AtomicUsize,
    fetches: AtomicUsize,
    deletes: AtomicUsize,
    delete_alls: AtomicUsize,
    unavailable: Mutex<Option<String>>,
    gate: watch::Sender<bool>,
}

impl Default for MemoryRemoteDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemoteDatabase {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            tables: Mutex::new(HashMap::new()),
            upserts: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            delete_alls: AtomicUsize::new(0),
            unavailable: Mutex::new(None),
            gate,
        }
    }

    /// Store `items` for `user_id` without counting a call.
    pub fn seed(&self, user_id: &str, items: Vec<InventoryItem>) {
        let mut tables = self.lock_tables();
        let table = tables.entry(user_id.to_string()).or_default();
        for item in items {
            upsert_record(table, user_id, item);
        }
    }

    pub fn records(&self, user_id: &str) -> Vec<RemoteRecord> {
        self.lock_tables()
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn items(&self, user_id: &str) -> Vec<InventoryItem> {
        self.records(user_id)
            .into_iter()
            .map(|record| record.item)
            .collect()
    }

    pub fn call_counts(&self) -> RemoteCallCounts {
        RemoteCallCounts {
            upserts: self.upserts.load(Ordering::SeqCst),
            fetches: self.fetches.load(Ordering::SeqCst),
            deletes: self.deletes.load(Ordering::SeqCst),
            delete_alls: self.delete_alls.load(Ordering::SeqCst),
        }
    }

    /// Make every following call fail with [`RemoteError::Unavailable`].
    pub fn set_unavailable(&self, message: Option<&str>) {
        *self
            .unavailable
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = message.map(str::to_string);
    }

    /// Hold incoming calls until [`Self::open_gate`].
    pub fn close_gate(&self) {
        self.gate.send_replace(false);
    }

    pub fn open_gate(&self) {
        self.gate.send_replace(true);
    }

    async fn enter(&self, counter: &AtomicUsize) -> RemoteResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);

        let mut gate = self.gate.subscribe();
        // the sender lives as long as self, so this only errors on teardown
        let _ = gate.wait_for(|open| *open).await;

        let unavailable = self
            .unavailable
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match unavailable {
            Some(message) => Err(RemoteError::Unavailable(message)),
            None => Ok(()),
        }
    }

    fn lock_tables(&self) -> MutexGuard<'_, HashMap<String, Vec<RemoteRecord>>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn upsert_record(table: &mut Vec<RemoteRecord>, user_id: &str, item: InventoryItem) {
    let record = RemoteRecord {
        user_id: user_id.to_string(),
        item,
        updated_at: Utc::now(),
    };
    match table
        .iter()
        .position(|existing| existing.item.id == record.item.id)
    {
        Some(index) => table[index] = record,
        None => table.push(record),
    }
}

#[async_trait]
impl RemoteDatabase for MemoryRemoteDatabase {
    async fn upsert(&self, scope: &RemoteScope, items: &[InventoryItem]) -> RemoteResult<()> {
        self.enter(&self.upserts).await?;
        let mut tables = self.lock_tables();
        let table = tables.entry(scope.user_id.clone()).or_default();
        for item in items {
            upsert_record(table, &scope.user_id, item.clone());
        }
        Ok(())
    }

    async fn fetch_all(&self, scope: &RemoteScope) -> RemoteResult<Vec<RemoteRecord>> {
        self.enter(&self.fetches).await?;
        Ok(self.records(&scope.user_id))
    }

    async fn delete(&self, scope: &RemoteScope, id: &ItemId) -> RemoteResult<()> {
        self.enter(&self.deletes).await?;
        if let Some(table) = self.lock_tables().get_mut(&scope.user_id) {
            table.retain(|record| record.item.id != *id);
        }
        Ok(())
    }

    async fn delete_all(&self, scope: &RemoteScope) -> RemoteResult<usize> {
        self.enter(&self.delete_alls).await?;
        Ok(self
            .lock_tables()
            .remove(&scope.user_id)
            .map_or(0, |table| table.len()))
    }
}
