//! End-to-end login, logout and manual sync flows against the in-memory remote.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use pantry_core::auth::{AuthEvent, AuthSession, AuthTracker, AuthUser};
use pantry_core::db::LibSqlRecordPersistence;
use pantry_core::persistence::{JsonFilePersistence, RecordPersistence};
use pantry_core::reminders::{RecordingReminders, ReminderCall};
use pantry_core::remote::{MemoryRemoteDatabase, RemoteStoreClient};
use pantry_core::sync::{PromptKind, SyncStatus};
use pantry_core::{
    FoodCategory, InventoryItem, ItemId, LocalStore, SyncCoordinator, SyncError, SyncOutcome,
};
use pretty_assertions::assert_eq;

const USER: &str = "user-42";
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

struct App {
    coordinator: Arc<SyncCoordinator>,
    store: Arc<LocalStore>,
    remote: Arc<MemoryRemoteDatabase>,
    auth: Arc<AuthTracker>,
    reminders: Arc<RecordingReminders>,
}

impl App {
    fn new(persistence: Arc<dyn RecordPersistence>) -> Self {
        let remote = Arc::new(MemoryRemoteDatabase::new());
        let auth = Arc::new(AuthTracker::default());
        let reminders = Arc::new(RecordingReminders::new());
        let store = Arc::new(LocalStore::new(persistence, reminders.clone()));
        let coordinator = Arc::new(SyncCoordinator::new(RemoteStoreClient::new(
            remote.clone(),
            auth.clone(),
        )));
        coordinator.inject_store(store.clone());
        Self {
            coordinator,
            store,
            remote,
            auth,
            reminders,
        }
    }

    fn in_memory() -> Self {
        Self::new(Arc::new(pantry_core::persistence::MemoryPersistence::new()))
    }

    async fn log_in(&self) -> SyncOutcome {
        let events = self.auth.sign_in(session());
        assert_eq!(events, vec![AuthEvent::LoggedIn(user())]);
        self.coordinator.handle_auth_event(&events[0]).await
    }

    async fn log_out(&self) -> SyncOutcome {
        let events = self.auth.sign_out();
        assert_eq!(events, vec![AuthEvent::LoggedOut(user())]);
        self.coordinator.handle_auth_event(&events[0]).await
    }

    fn remote_ids(&self) -> HashSet<ItemId> {
        self.remote.items(USER).iter().map(|item| item.id).collect()
    }
}

fn user() -> AuthUser {
    AuthUser {
        id: USER.to_string(),
        email: Some("cook@example.com".to_string()),
    }
}

fn session() -> AuthSession {
    AuthSession {
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
        expires_at: i64::MAX,
        user: user(),
    }
}

fn item(name: &str) -> InventoryItem {
    InventoryItem::new(name, FoodCategory::Produce, 30 * DAY_MS)
}

#[tokio::test(flavor = "multi_thread")]
async fn login_with_local_items_uploads_after_confirm() {
    let app = App::in_memory();
    let a = item("Apples");
    app.store.add(a.clone()).await;

    assert_eq!(app.log_in().await, SyncOutcome::ok());
    assert_eq!(
        app.coordinator.pending_prompt(),
        Some(PromptKind::UploadLocalData)
    );
    assert_eq!(app.remote.call_counts().total(), 0);

    assert_eq!(app.coordinator.confirm_pending_prompt().await, SyncOutcome::ok());

    assert_eq!(app.remote.items(USER), vec![a.clone()]);
    assert_eq!(app.store.snapshot(), vec![a]);
    assert_eq!(app.coordinator.status(), SyncStatus::default());
}

#[tokio::test(flavor = "multi_thread")]
async fn login_with_empty_store_pulls_without_prompt() {
    let app = App::in_memory();
    let remote_items = vec![item("Bananas"), item("Cherries")];
    app.remote.seed(USER, remote_items.clone());

    assert_eq!(app.log_in().await, SyncOutcome::ok());

    assert_eq!(app.coordinator.pending_prompt(), None);
    assert_eq!(app.store.snapshot(), remote_items);
    assert_eq!(app.remote.call_counts().upserts, 0);
    assert_eq!(app.remote.call_counts().deletes, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn confirm_merge_keeps_local_version_of_shared_item() {
    let app = App::in_memory();
    let a = item("Dates");
    let mut a_remote = a.clone();
    a_remote.name = "Medjool dates".to_string();
    a_remote.expires_at += DAY_MS;
    let d = item("Figs");
    app.store.add(a.clone()).await;
    app.remote.seed(USER, vec![a_remote, d.clone()]);

    app.log_in().await;
    let outcome = app.coordinator.confirm_pending_prompt().await;

    assert_eq!(outcome, SyncOutcome::ok());
    assert_eq!(app.store.snapshot(), vec![a.clone(), d.clone()]);
    // the merged set is pushed back, so the remote now holds the local edit
    assert_eq!(app.remote.items(USER), vec![a, d]);
    assert_eq!(app.remote.call_counts().deletes, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn logout_confirm_clears_local_and_leaves_remote() {
    let app = App::in_memory();
    app.log_in().await;
    let g = item("Grapes");
    app.store.add(g.clone()).await;
    app.coordinator.request_manual_sync().await;
    let remote_before = app.remote.items(USER);
    let calls_before = app.remote.call_counts();

    assert_eq!(app.log_out().await, SyncOutcome::ok());
    assert_eq!(
        app.coordinator.pending_prompt(),
        Some(PromptKind::DeleteLocalData)
    );
    assert_eq!(app.coordinator.confirm_pending_prompt().await, SyncOutcome::ok());

    assert!(app.store.is_empty());
    assert_eq!(app.reminders.calls().last(), Some(&ReminderCall::CancelAll));
    assert_eq!(app.remote.items(USER), remote_before);
    assert_eq!(app.remote.call_counts(), calls_before);
}

#[tokio::test(flavor = "multi_thread")]
async fn manual_sync_deletes_remote_only_items() {
    let app = App::in_memory();
    let a = item("Kiwi");
    let e = item("Lemons");
    app.remote.seed(USER, vec![a.clone(), e]);
    app.log_in().await;
    // the login pull brought in both; drop one locally
    assert_eq!(app.store.len(), 2);
    app.store.remove(&app.store.snapshot()[1].id).await;

    assert_eq!(app.coordinator.request_manual_sync().await, SyncOutcome::ok());

    assert_eq!(app.remote.items(USER), vec![a]);
}

#[tokio::test(flavor = "multi_thread")]
async fn second_manual_sync_is_rejected_while_first_is_in_flight() {
    let app = App::in_memory();
    app.log_in().await;
    app.store.add(item("Mangoes")).await;
    let mut status = app.coordinator.subscribe();
    app.remote.close_gate();

    let first = tokio::spawn({
        let coordinator = app.coordinator.clone();
        async move { coordinator.request_manual_sync().await }
    });
    tokio::time::timeout(Duration::from_secs(5), status.wait_for(|status| status.is_syncing))
        .await
        .unwrap()
        .unwrap();
    let calls_in_flight = app.remote.call_counts();

    let second = app.coordinator.request_manual_sync().await;

    assert_eq!(second, SyncOutcome::failed(SyncError::SyncInProgress));
    assert_eq!(app.remote.call_counts(), calls_in_flight);

    app.remote.open_gate();
    assert_eq!(first.await.unwrap(), SyncOutcome::ok());
    assert!(!app.coordinator.status().is_syncing);
    assert_eq!(app.remote.items(USER).len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn confirm_while_syncing_keeps_prompt() {
    let app = App::in_memory();
    app.log_in().await;
    app.store.add(item("Nectarines")).await;
    app.remote.close_gate();
    let mut status = app.coordinator.subscribe();
    let manual = tokio::spawn({
        let coordinator = app.coordinator.clone();
        async move { coordinator.request_manual_sync().await }
    });
    tokio::time::timeout(Duration::from_secs(5), status.wait_for(|status| status.is_syncing))
        .await
        .unwrap()
        .unwrap();

    app.log_out().await;
    assert_eq!(
        app.coordinator.confirm_pending_prompt().await,
        SyncOutcome::failed(SyncError::SyncInProgress)
    );
    assert_eq!(
        app.coordinator.pending_prompt(),
        Some(PromptKind::DeleteLocalData)
    );

    app.remote.open_gate();
    manual.await.unwrap();
    assert_eq!(app.coordinator.confirm_pending_prompt().await, SyncOutcome::ok());
    assert!(app.store.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn deletion_sync_removes_exactly_remote_minus_local() {
    let pool: Vec<InventoryItem> = (0..6).map(|index| item(&format!("Item {index}"))).collect();
    // (remote membership, local membership) masks over the pool
    let cases = [
        (0b11_1111, 0b00_0000),
        (0b11_1111, 0b10_1010),
        (0b00_1111, 0b11_0000),
        (0b00_0000, 0b11_1111),
        (0b10_0110, 0b10_0110),
    ];

    for (remote_mask, local_mask) in cases {
        let app = App::in_memory();
        let pick = |mask: u32| -> Vec<InventoryItem> {
            pool.iter()
                .enumerate()
                .filter(|(index, _)| mask & (1 << index) != 0)
                .map(|(_, item)| item.clone())
                .collect()
        };
        app.remote.seed(USER, pick(remote_mask));
        app.auth.sign_in(session());
        let local: HashSet<ItemId> = pick(local_mask).iter().map(|item| item.id).collect();
        let remote_before = app.remote_ids();

        let client = RemoteStoreClient::new(app.remote.clone(), app.auth.clone());
        let deleted: HashSet<ItemId> = client
            .sync_deletions(&local)
            .await
            .unwrap()
            .into_iter()
            .collect();

        let expected: HashSet<ItemId> = remote_before.difference(&local).copied().collect();
        assert_eq!(deleted, expected);
        assert_eq!(
            app.remote_ids(),
            remote_before.intersection(&local).copied().collect()
        );
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn merged_state_survives_restart_with_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.json");
    let app = App::new(Arc::new(JsonFilePersistence::new(&path)));
    app.store.add(item("Oranges").with_note("blood")).await;
    app.remote.seed(USER, vec![item("Papaya")]);
    app.log_in().await;
    app.coordinator.confirm_pending_prompt().await;

    let reopened = LocalStore::new(
        Arc::new(JsonFilePersistence::new(&path)),
        Arc::new(RecordingReminders::new()),
    );
    assert_eq!(reopened.load().await, 2);
    assert_eq!(reopened.snapshot(), app.store.snapshot());
}

#[tokio::test(flavor = "multi_thread")]
async fn merged_state_survives_restart_with_libsql() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pantry.db");
    let persistence = Arc::new(LibSqlRecordPersistence::open(&path).await.unwrap());
    let app = App::new(persistence);
    app.remote.seed(USER, vec![item("Quince"), item("Raspberries")]);
    app.log_in().await;
    drop(app);

    let reopened = LocalStore::new(
        Arc::new(LibSqlRecordPersistence::open(&path).await.unwrap()),
        Arc::new(RecordingReminders::new()),
    );
    assert_eq!(reopened.load().await, 2);
}
