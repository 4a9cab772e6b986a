//! The local inventory store.
//!
//! `LocalStore` owns the in-memory collection that the UI renders from. Every
//! mutation is applied in memory first, then side effects run: the expiry
//! reminder is (re)scheduled or cancelled, a [`StoreEvent`] is published to
//! subscribers (the cloud mirror among them), and the whole collection is
//! saved. Side-effect failures are logged and never roll back the mutation.
//!
//! Saves are serialized: each save takes the save lock and only then
//! snapshots the collection, so the last completed save always reflects the
//! last applied mutation.

mod views;

pub use views::{sort_items, ExpiryWindow, ItemFilter, ItemSort};

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{broadcast, Mutex};

use crate::models::{FoodCategory, InventoryItem, ItemId, ItemTag};
use crate::persistence::RecordPersistence;
use crate::reminders::ReminderScheduler;
use crate::Result;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Change notification published after every applied mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Collection (re)loaded from persistence
    Loaded { count: usize },
    Added(InventoryItem),
    Updated(InventoryItem),
    Removed(ItemId),
    /// Collection replaced wholesale (sync merge)
    Replaced { count: usize },
    Cleared,
}

/// Construction options for [`LocalStore`]
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Items installed when persistence reports that nothing was ever saved
    pub seed: Vec<InventoryItem>,
}

pub struct LocalStore {
    items: RwLock<Vec<InventoryItem>>,
    persistence: Arc<dyn RecordPersistence>,
    reminders: Arc<dyn ReminderScheduler>,
    save_lock: Mutex<()>,
    events: broadcast::Sender<StoreEvent>,
    options: StoreOptions,
}

impl LocalStore {
    pub fn new(
        persistence: Arc<dyn RecordPersistence>,
        reminders: Arc<dyn ReminderScheduler>,
    ) -> Self {
        Self::with_options(persistence, reminders, StoreOptions::default())
    }

    pub fn with_options(
        persistence: Arc<dyn RecordPersistence>,
        reminders: Arc<dyn ReminderScheduler>,
        options: StoreOptions,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            items: RwLock::new(Vec::new()),
            persistence,
            reminders,
            save_lock: Mutex::new(()),
            events,
            options,
        }
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Read persisted items into memory.
    ///
    /// Never fails: a first run installs the seed set, unreadable storage
    /// degrades to an empty collection. Returns the number of items loaded.
    pub async fn load(&self) -> usize {
        let items = match self.persistence.load_records().await {
            Ok(Some(items)) => items,
            Ok(None) => {
                tracing::info!(
                    "No saved inventory found, starting with {} seed items",
                    self.options.seed.len()
                );
                self.options.seed.clone()
            }
            Err(error) => {
                tracing::warn!("Failed to load saved inventory, starting empty: {}", error);
                Vec::new()
            }
        };

        let count = items.len();
        *self.write_items() = items;
        self.publish(StoreEvent::Loaded { count });
        count
    }

    /// Persist the current collection.
    ///
    /// On failure the in-memory collection stays authoritative until the next
    /// successful save.
    pub async fn save(&self) -> Result<()> {
        let _guard = self.save_lock.lock().await;
        let snapshot = self.snapshot();
        self.persistence.save_records(&snapshot).await
    }

    /// Add an item. An item whose id is already present replaces it in place.
    pub async fn add(&self, item: InventoryItem) {
        {
            let mut items = self.write_items();
            match items.iter().position(|existing| existing.id == item.id) {
                Some(index) => {
                    tracing::warn!(item_id = %item.id, "Item id already present, replacing");
                    items[index] = item.clone();
                }
                None => items.push(item.clone()),
            }
        }

        self.reminders.schedule(&item);
        self.publish(StoreEvent::Added(item));
        self.persist().await;
    }

    /// Replace the stored item that has the same id.
    ///
    /// Returns `false` (and does nothing) when no such item exists.
    pub async fn update(&self, item: InventoryItem) -> bool {
        let applied = {
            let mut items = self.write_items();
            match items.iter().position(|existing| existing.id == item.id) {
                Some(index) => {
                    items[index] = item.clone();
                    true
                }
                None => false,
            }
        };

        if !applied {
            tracing::debug!(item_id = %item.id, "Ignoring update for unknown item");
            return false;
        }

        self.reminders.schedule(&item);
        self.publish(StoreEvent::Updated(item));
        self.persist().await;
        true
    }

    /// Remove an item by id. Idempotent; returns whether anything was removed.
    pub async fn remove(&self, id: &ItemId) -> bool {
        let removed = {
            let mut items = self.write_items();
            let before = items.len();
            items.retain(|item| item.id != *id);
            items.len() != before
        };

        if !removed {
            return false;
        }

        self.reminders.cancel(id);
        self.publish(StoreEvent::Removed(*id));
        self.persist().await;
        true
    }

    /// Overwrite the whole collection, rescheduling every reminder.
    ///
    /// The replacement is applied in memory before the first await, so a
    /// caller that snapshots and replaces without awaiting in between cannot
    /// lose a concurrent mutation. The returned error is the save failure
    /// only; the in-memory collection is replaced regardless.
    pub async fn replace_all(&self, items: Vec<InventoryItem>) -> Result<()> {
        let count = items.len();
        *self.write_items() = items.clone();

        self.reminders.cancel_all();
        for item in &items {
            self.reminders.schedule(item);
        }
        self.publish(StoreEvent::Replaced { count });
        self.save().await
    }

    /// Drop every item and cancel every reminder.
    ///
    /// Like [`Self::replace_all`], only the save can fail.
    pub async fn clear(&self) -> Result<()> {
        self.write_items().clear();

        self.reminders.cancel_all();
        self.publish(StoreEvent::Cleared);
        self.save().await
    }

    /// Copy of the current collection, in insertion order
    pub fn snapshot(&self) -> Vec<InventoryItem> {
        self.read_items().clone()
    }

    pub fn len(&self) -> usize {
        self.read_items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_items().is_empty()
    }

    pub fn get(&self, id: &ItemId) -> Option<InventoryItem> {
        self.read_items().iter().find(|item| item.id == *id).cloned()
    }

    /// Identifier set of the current collection
    pub fn ids(&self) -> HashSet<ItemId> {
        self.read_items().iter().map(|item| item.id).collect()
    }

    /// Items passing `filter` at `now_ms`, in insertion order
    pub fn filtered(&self, filter: &ItemFilter, now_ms: i64) -> Vec<InventoryItem> {
        self.read_items()
            .iter()
            .filter(|item| filter.matches(item, now_ms))
            .cloned()
            .collect()
    }

    /// Items passing `filter`, sorted
    pub fn list(&self, filter: &ItemFilter, sort: ItemSort, now_ms: i64) -> Vec<InventoryItem> {
        let mut items = self.filtered(filter, now_ms);
        sort_items(&mut items, sort);
        items
    }

    pub fn by_category(&self, category: FoodCategory) -> Vec<InventoryItem> {
        self.filtered(&ItemFilter::category(category), 0)
    }

    pub fn by_tag(&self, tag: ItemTag) -> Vec<InventoryItem> {
        self.filtered(&ItemFilter::tag(tag), 0)
    }

    /// Items not yet expired at `now_ms` that expire within `window_ms`, soonest first
    pub fn expiring_within(&self, now_ms: i64, window_ms: i64) -> Vec<InventoryItem> {
        self.list(
            &ItemFilter::expiring_within(window_ms),
            ItemSort::ExpiresSoonest,
            now_ms,
        )
    }

    /// Items already expired at `now_ms`, soonest first
    pub fn expired(&self, now_ms: i64) -> Vec<InventoryItem> {
        self.list(&ItemFilter::expired(), ItemSort::ExpiresSoonest, now_ms)
    }

    async fn persist(&self) {
        if let Err(error) = self.save().await {
            tracing::warn!("Failed to save inventory, keeping in-memory state: {}", error);
        }
    }

    fn publish(&self, event: StoreEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn read_items(&self) -> std::sync::RwLockReadGuard<'_, Vec<InventoryItem>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_items(&self) -> std::sync::RwLockWriteGuard<'_, Vec<InventoryItem>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::persistence::MemoryPersistence;
    use crate::reminders::{RecordingReminders, ReminderCall};
    use crate::Error;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    struct FailingPersistence;

    #[async_trait]
    impl RecordPersistence for FailingPersistence {
        async fn load_records(&self) -> Result<Option<Vec<InventoryItem>>> {
            Err(Error::Database("disk unavailable".to_string()))
        }

        async fn save_records(&self, _items: &[InventoryItem]) -> Result<()> {
            Err(Error::Database("disk unavailable".to_string()))
        }
    }

    /// Memory persistence whose saves take uneven time, later calls often
    /// shorter than earlier ones.
    struct SlowPersistence {
        inner: MemoryPersistence,
        saves: AtomicU64,
    }

    #[async_trait]
    impl RecordPersistence for SlowPersistence {
        async fn load_records(&self) -> Result<Option<Vec<InventoryItem>>> {
            self.inner.load_records().await
        }

        async fn save_records(&self, items: &[InventoryItem]) -> Result<()> {
            let call = self.saves.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(7 - call % 8)).await;
            self.inner.save_records(items).await
        }
    }

    fn store_with(
        persistence: Arc<MemoryPersistence>,
    ) -> (LocalStore, Arc<RecordingReminders>) {
        let reminders = Arc::new(RecordingReminders::new());
        let store = LocalStore::new(persistence, reminders.clone());
        (store, reminders)
    }

    fn milk() -> InventoryItem {
        InventoryItem::new("Milk", FoodCategory::Dairy, 10 * DAY_MS)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn add_persists_and_schedules_reminder() {
        let persistence = Arc::new(MemoryPersistence::new());
        let (store, reminders) = store_with(persistence.clone());
        let item = milk();

        store.add(item.clone()).await;

        assert_eq!(store.snapshot(), vec![item.clone()]);
        assert_eq!(persistence.snapshot(), Some(vec![item.clone()]));
        assert_eq!(reminders.calls(), vec![ReminderCall::Schedule(item.id)]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_unknown_item_is_noop() {
        let persistence = Arc::new(MemoryPersistence::new());
        let (store, reminders) = store_with(persistence.clone());

        assert!(!store.update(milk()).await);
        assert!(store.is_empty());
        assert!(persistence.snapshot().is_none());
        assert!(reminders.calls().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_replaces_fields_by_id() {
        let (store, _) = store_with(Arc::new(MemoryPersistence::new()));
        let item = milk();
        store.add(item.clone()).await;

        let mut edited = item.clone();
        edited.name = "Oat milk".to_string();
        assert!(store.update(edited.clone()).await);

        assert_eq!(store.get(&item.id), Some(edited));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn remove_is_idempotent() {
        let persistence = Arc::new(MemoryPersistence::new());
        let (store, reminders) = store_with(persistence.clone());
        let item = milk();
        store.add(item.clone()).await;

        assert!(store.remove(&item.id).await);
        assert!(!store.remove(&item.id).await);

        assert!(store.is_empty());
        assert_eq!(persistence.snapshot(), Some(Vec::new()));
        assert_eq!(
            reminders.calls(),
            vec![
                ReminderCall::Schedule(item.id),
                ReminderCall::Cancel(item.id)
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn load_uses_seed_on_first_run_only() {
        let seed = vec![milk()];
        let options = StoreOptions { seed: seed.clone() };

        let fresh = LocalStore::with_options(
            Arc::new(MemoryPersistence::new()),
            Arc::new(RecordingReminders::new()),
            options.clone(),
        );
        assert_eq!(fresh.load().await, 1);
        assert_eq!(fresh.snapshot(), seed);

        let returning = LocalStore::with_options(
            Arc::new(MemoryPersistence::with_records(Vec::new())),
            Arc::new(RecordingReminders::new()),
            options,
        );
        assert_eq!(returning.load().await, 0);
        assert!(returning.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn load_degrades_to_empty_on_storage_failure() {
        let store = LocalStore::with_options(
            Arc::new(FailingPersistence),
            Arc::new(RecordingReminders::new()),
            StoreOptions { seed: vec![milk()] },
        );

        assert_eq!(store.load().await, 0);
        assert!(store.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn save_failure_keeps_in_memory_mutation() {
        let store = LocalStore::new(
            Arc::new(FailingPersistence),
            Arc::new(RecordingReminders::new()),
        );
        let item = milk();

        store.add(item.clone()).await;

        assert_eq!(store.snapshot(), vec![item]);
        assert!(store.save().await.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn save_then_fresh_load_roundtrip() {
        let persistence = Arc::new(MemoryPersistence::new());
        let (store, _) = store_with(persistence.clone());
        store.add(milk()).await;
        store
            .add(InventoryItem::new("Kimchi", FoodCategory::Condiments, 60 * DAY_MS).with_note("jar"))
            .await;
        store.save().await.unwrap();

        let (reloaded, _) = store_with(persistence);
        reloaded.load().await;

        assert_eq!(reloaded.snapshot(), store.snapshot());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn clear_cancels_all_reminders() {
        let (store, reminders) = store_with(Arc::new(MemoryPersistence::new()));
        store.add(milk()).await;

        store.clear().await.unwrap();

        assert!(store.is_empty());
        assert_eq!(reminders.calls().last(), Some(&ReminderCall::CancelAll));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn replace_all_reschedules_and_reports_save_failure() {
        let reminders = Arc::new(RecordingReminders::new());
        let store = LocalStore::new(Arc::new(FailingPersistence), reminders.clone());
        let items = vec![milk(), milk()];

        assert!(store.replace_all(items.clone()).await.is_err());

        assert_eq!(store.snapshot(), items.clone());
        assert_eq!(
            reminders.calls(),
            vec![
                ReminderCall::CancelAll,
                ReminderCall::Schedule(items[0].id),
                ReminderCall::Schedule(items[1].id)
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn mutations_publish_events() {
        let (store, _) = store_with(Arc::new(MemoryPersistence::new()));
        let mut events = store.subscribe();
        let item = milk();

        store.add(item.clone()).await;
        store.remove(&item.id).await;

        assert_eq!(events.recv().await.unwrap(), StoreEvent::Added(item.clone()));
        assert_eq!(events.recv().await.unwrap(), StoreEvent::Removed(item.id));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn derived_views_filter_snapshot() {
        let (store, _) = store_with(Arc::new(MemoryPersistence::new()));
        let now = 50 * DAY_MS;
        let cheese = InventoryItem::new("Cheese", FoodCategory::Dairy, now + 2 * DAY_MS)
            .with_tag(ItemTag::Opened);
        let apples = InventoryItem::new("Apples", FoodCategory::Produce, now + 20 * DAY_MS);
        let spinach = InventoryItem::new("Spinach", FoodCategory::Produce, now - DAY_MS);
        for item in [cheese.clone(), apples.clone(), spinach.clone()] {
            store.add(item).await;
        }

        assert_eq!(store.by_category(FoodCategory::Produce).len(), 2);
        assert_eq!(store.by_tag(ItemTag::Opened), vec![cheese.clone()]);
        assert_eq!(store.expiring_within(now, 7 * DAY_MS), vec![cheese]);
        assert_eq!(store.expired(now), vec![spinach]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_mutations_leave_latest_state_persisted() {
        let persistence = Arc::new(SlowPersistence {
            inner: MemoryPersistence::new(),
            saves: AtomicU64::new(0),
        });
        let store = Arc::new(LocalStore::new(
            persistence.clone(),
            Arc::new(RecordingReminders::new()),
        ));

        let tasks = (0..40)
            .map(|index| {
                let store = store.clone();
                tokio::spawn(async move {
                    let item = InventoryItem::new(
                        format!("Item {index}"),
                        FoodCategory::Pantry,
                        (index + 1) * DAY_MS,
                    );
                    let id = item.id;
                    store.add(item).await;
                    if index % 3 == 0 {
                        store.remove(&id).await;
                    }
                })
            })
            .collect::<Vec<_>>();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(store.len(), 26);
        assert_eq!(persistence.inner.snapshot(), Some(store.snapshot()));
    }
}
