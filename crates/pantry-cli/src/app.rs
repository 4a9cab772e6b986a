//! Composition root: builds the store and, when configured, the cloud stack.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pantry_core::auth::{AuthTracker, SupabaseAuthClient};
use pantry_core::config::SyncSettings;
use pantry_core::db::LibSqlRecordPersistence;
use pantry_core::reminders::LoggingReminders;
use pantry_core::remote::{RemoteStoreClient, RestRemoteDatabase};
use pantry_core::store::StoreEvent;
use pantry_core::sync::CloudMirror;
use pantry_core::{LocalStore, SyncCoordinator};
use tokio::sync::broadcast;

use crate::auth::KeychainSessionStore;
use crate::error::CliError;

const DATA_DIR_NAME: &str = "pantry";
const DATABASE_FILE_NAME: &str = "pantry.db";
const SETTINGS_FILE_NAME: &str = "sync.json";

pub struct App {
    pub store: Arc<LocalStore>,
    cloud: Option<Cloud>,
}

pub struct Cloud {
    pub auth_client: SupabaseAuthClient<KeychainSessionStore>,
    pub tracker: Arc<AuthTracker>,
    pub remote: RemoteStoreClient,
    pub coordinator: Arc<SyncCoordinator>,
    mirror: CloudMirror,
}

impl App {
    pub async fn open(data_dir: Option<&Path>, config_path: Option<&Path>) -> Result<Self, CliError> {
        let data_dir = data_dir.map_or_else(default_data_dir, Path::to_path_buf);
        let settings_path = config_path.map_or_else(
            || data_dir.join(SETTINGS_FILE_NAME),
            Path::to_path_buf,
        );
        let settings = SyncSettings::load(&settings_path)?;

        let persistence =
            Arc::new(LibSqlRecordPersistence::open(data_dir.join(DATABASE_FILE_NAME)).await?);
        let store = Arc::new(LocalStore::new(persistence, Arc::new(LoggingReminders)));
        store.load().await;

        let cloud = if settings.is_sync_enabled() {
            let cloud = Cloud::connect(&settings).await?;
            cloud.coordinator.inject_store(store.clone());
            Some(cloud)
        } else {
            tracing::debug!("Cloud sync not configured, running local-only");
            None
        };

        Ok(Self { store, cloud })
    }

    pub fn cloud(&self) -> Result<&Cloud, CliError> {
        self.cloud.as_ref().ok_or(CliError::SyncNotConfigured)
    }

    /// Push the store events received so far to the cloud, if signed in.
    ///
    /// The CLI exits right after a command, so changes are mirrored inline
    /// instead of on a background task.
    pub async fn mirror_changes(&self, events: &mut broadcast::Receiver<StoreEvent>) {
        let Some(cloud) = &self.cloud else {
            return;
        };
        while let Ok(event) = events.try_recv() {
            if let Err(error) = cloud.mirror.apply(&event).await {
                tracing::warn!("Failed to mirror change to the cloud: {}", error);
                eprintln!("Saved locally; cloud copy will catch up on `pantry sync`.");
            }
        }
    }
}

impl Cloud {
    async fn connect(settings: &SyncSettings) -> Result<Self, CliError> {
        let (url, anon_key) = settings.supabase().ok_or(CliError::SyncNotConfigured)?;
        let auth_client =
            SupabaseAuthClient::new(url, anon_key, KeychainSessionStore::for_settings(settings))?;

        let session = match auth_client.restore_session().await {
            Ok(session) => session,
            Err(error) => {
                tracing::warn!("Could not restore stored session: {}", error);
                None
            }
        };
        let tracker = Arc::new(AuthTracker::new(session));

        let database = Arc::new(RestRemoteDatabase::from_settings(settings)?);
        let remote = RemoteStoreClient::new(database, tracker.clone());
        let coordinator = Arc::new(SyncCoordinator::new(remote.clone()));
        let mirror = CloudMirror::new(remote.clone());

        Ok(Self {
            auth_client,
            tracker,
            remote,
            coordinator,
            mirror,
        })
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(".pantry"),
        |dir| dir.join(DATA_DIR_NAME),
    )
}
