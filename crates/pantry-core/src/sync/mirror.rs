//! Background push of individual store mutations to the remote.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::remote::{RemoteResult, RemoteStoreClient};
use crate::store::StoreEvent;

/// Mirrors single-item adds, updates and removals while signed in.
///
/// Bulk events (load, replace, clear) are left alone: replacing is the sync
/// coordinator's job and clearing after logout must never reach the remote.
/// Failures are logged and dropped; the next manual sync reconciles them.
#[derive(Clone)]
pub struct CloudMirror {
    remote: RemoteStoreClient,
}

impl CloudMirror {
    pub const fn new(remote: RemoteStoreClient) -> Self {
        Self { remote }
    }

    /// Push one store event. Signed out, this does nothing.
    pub async fn apply(&self, event: &StoreEvent) -> RemoteResult<()> {
        if !self.remote.is_authenticated() {
            return Ok(());
        }

        match event {
            StoreEvent::Added(item) | StoreEvent::Updated(item) => {
                self.remote.upload(std::slice::from_ref(item)).await
            }
            StoreEvent::Removed(id) => self.remote.delete(id).await,
            StoreEvent::Loaded { .. } | StoreEvent::Replaced { .. } | StoreEvent::Cleared => {
                Ok(())
            }
        }
    }

    /// Consume `events` on a background task until the store is dropped.
    pub fn spawn(self, mut events: broadcast::Receiver<StoreEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if let Err(error) = self.apply(&event).await {
                            tracing::warn!("Failed to mirror change to remote: {}", error);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Cloud mirror fell behind, run a manual sync");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
