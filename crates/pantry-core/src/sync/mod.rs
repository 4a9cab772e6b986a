//! Sync coordinator.
//!
//! Reacts to login/logout transitions and to user-requested syncs:
//!
//! | state             | event                 | action                                        |
//! |-------------------|-----------------------|-----------------------------------------------|
//! | idle              | logged in, items      | prompt `UploadLocalData`                      |
//! | idle              | logged in, no items   | fetch, merge, replace local, save             |
//! | idle              | logged out, items     | prompt `DeleteLocalData`                      |
//! | idle              | logged out, no items  | nothing                                       |
//! | prompting(upload) | confirm               | fetch, merge, replace, save, upload merged    |
//! | prompting(delete) | confirm               | clear local items and reminders               |
//! | prompting(*)      | cancel                | drop the prompt                               |
//! | any               | manual sync           | upload local items, delete remote-only ids    |
//!
//! At most one round trip runs at a time. A request that arrives while one is
//! in flight is rejected with [`SyncError::SyncInProgress`] before any network
//! call. Logging in never deletes remote data; logging out never touches it.

mod mirror;
mod state;

pub use mirror::CloudMirror;
pub use state::{PromptKind, SyncError, SyncOutcome, SyncStatus};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{broadcast, watch};

use crate::auth::AuthEvent;
use crate::merge::merge;
use crate::remote::RemoteStoreClient;
use crate::store::LocalStore;

pub struct SyncCoordinator {
    remote: RemoteStoreClient,
    store: RwLock<Option<Arc<LocalStore>>>,
    syncing: AtomicBool,
    status: watch::Sender<SyncStatus>,
}

impl SyncCoordinator {
    /// Create a coordinator. It does nothing useful until a store is injected.
    pub fn new(remote: RemoteStoreClient) -> Self {
        let (status, _) = watch::channel(SyncStatus::default());
        Self {
            remote,
            store: RwLock::new(None),
            syncing: AtomicBool::new(false),
            status,
        }
    }

    pub fn inject_store(&self, store: Arc<LocalStore>) {
        *self.store.write().unwrap_or_else(PoisonError::into_inner) = Some(store);
    }

    /// Observe `{is_syncing, pending_prompt}`
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> SyncStatus {
        *self.status.borrow()
    }

    pub fn pending_prompt(&self) -> Option<PromptKind> {
        self.status.borrow().pending_prompt
    }

    /// React to an auth transition.
    ///
    /// A new transition replaces any prompt still pending from an earlier one.
    pub async fn handle_auth_event(&self, event: &AuthEvent) -> SyncOutcome {
        let Some(store) = self.injected_store() else {
            return SyncOutcome::failed(SyncError::StoreNotInjected);
        };

        let has_local_items = !store.is_empty();
        match event {
            AuthEvent::LoggedIn(user) if has_local_items => {
                tracing::info!(user_id = %user.id, "Logged in with local items, asking to upload");
                self.set_prompt(Some(PromptKind::UploadLocalData));
                SyncOutcome::ok()
            }
            AuthEvent::LoggedIn(user) => {
                tracing::info!(user_id = %user.id, "Logged in with no local items, pulling remote");
                self.set_prompt(None);
                let Some(_guard) = self.try_begin() else {
                    return SyncOutcome::failed(SyncError::SyncInProgress);
                };
                self.report(self.pull_and_merge(&store, false).await)
            }
            AuthEvent::LoggedOut(user) if has_local_items => {
                tracing::info!(user_id = %user.id, "Logged out with local items, asking to delete");
                self.set_prompt(Some(PromptKind::DeleteLocalData));
                SyncOutcome::ok()
            }
            AuthEvent::LoggedOut(user) => {
                tracing::debug!(user_id = %user.id, "Logged out with no local items");
                self.set_prompt(None);
                SyncOutcome::ok()
            }
        }
    }

    /// Carry out the pending prompt.
    ///
    /// A confirm rejected with `SyncInProgress` leaves the prompt pending so it
    /// can be confirmed again. Any other outcome consumes it.
    pub async fn confirm_pending_prompt(&self) -> SyncOutcome {
        let Some(store) = self.injected_store() else {
            return SyncOutcome::failed(SyncError::StoreNotInjected);
        };
        let Some(prompt) = self.pending_prompt() else {
            tracing::debug!("Confirm requested with no pending prompt");
            return SyncOutcome::failed(SyncError::NoPendingPrompt);
        };
        let Some(_guard) = self.try_begin() else {
            return SyncOutcome::failed(SyncError::SyncInProgress);
        };
        self.set_prompt(None);

        let result = match prompt {
            PromptKind::UploadLocalData => {
                if self.remote.is_authenticated() {
                    self.pull_and_merge(&store, true).await
                } else {
                    Err(SyncError::Unauthenticated)
                }
            }
            PromptKind::DeleteLocalData => {
                tracing::info!(count = store.len(), "Clearing local items after logout");
                store.clear().await.map_err(SyncError::from)
            }
        };
        self.report(result)
    }

    /// Drop the pending prompt. Returns whether one was pending.
    pub fn cancel_pending_prompt(&self) -> bool {
        let cancelled = self.pending_prompt().is_some();
        if cancelled {
            tracing::debug!("Pending prompt cancelled");
            self.set_prompt(None);
        }
        cancelled
    }

    /// Push every local item, then delete remote items that no longer exist
    /// locally.
    pub async fn request_manual_sync(&self) -> SyncOutcome {
        let Some(store) = self.injected_store() else {
            return SyncOutcome::failed(SyncError::StoreNotInjected);
        };
        let Some(_guard) = self.try_begin() else {
            tracing::debug!("Manual sync rejected, another sync is running");
            return SyncOutcome::failed(SyncError::SyncInProgress);
        };

        let result: Result<(), SyncError> = async {
            let snapshot = store.snapshot();
            self.remote.upload(&snapshot).await?;
            // ids read after the upload so items removed meanwhile are not kept
            let deleted = self.remote.sync_deletions(&store.ids()).await?;
            tracing::info!(
                uploaded = snapshot.len(),
                deleted = deleted.len(),
                "Manual sync finished"
            );
            Ok(())
        }
        .await;
        self.report(result)
    }

    /// Drive the coordinator from an auth event stream until it closes.
    pub async fn run(self: Arc<Self>, mut events: broadcast::Receiver<AuthEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    self.handle_auth_event(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Sync coordinator missed auth events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("Auth event stream closed, sync coordinator stopped");
    }

    /// Fetch, merge local-wins, replace the local collection and save it.
    /// With `upload_merged` the merged set is pushed back afterwards; remote
    /// records are never deleted on this path.
    async fn pull_and_merge(&self, store: &LocalStore, upload_merged: bool) -> Result<(), SyncError> {
        let remote_items = self.remote.fetch().await?;

        // no await between snapshot and replace, so no local edit is lost
        let merged = merge(&store.snapshot(), &remote_items);
        tracing::debug!(
            appended = merged.appended.len(),
            kept_local = merged.kept_local.len(),
            "Merged remote items"
        );
        let items = merged.items;
        let saved = store.replace_all(items.clone()).await;

        if upload_merged {
            self.remote.upload(&items).await?;
        }
        saved.map_err(SyncError::from)
    }

    fn report(&self, result: Result<(), SyncError>) -> SyncOutcome {
        if let Err(error) = &result {
            tracing::warn!("Sync failed: {}", error);
        }
        SyncOutcome::from(result)
    }

    fn injected_store(&self) -> Option<Arc<LocalStore>> {
        let store = self
            .store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if store.is_none() {
            tracing::error!("Sync coordinator used before a local store was injected");
        }
        store
    }

    fn set_prompt(&self, prompt: Option<PromptKind>) {
        self.status.send_modify(|status| status.pending_prompt = prompt);
    }

    fn try_begin(&self) -> Option<SyncGuard<'_>> {
        self.syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.status.send_modify(|status| status.is_syncing = true);
        Some(SyncGuard { coordinator: self })
    }
}

/// Clears the syncing flag when the round trip ends, however it ends.
struct SyncGuard<'a> {
    coordinator: &'a SyncCoordinator,
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.coordinator
            .status
            .send_modify(|status| status.is_syncing = false);
        self.coordinator.syncing.store(false, Ordering::Release);
    }
}
