use std::io;

use pantry_core::auth::AuthError;
use pantry_core::remote::RemoteError;
use pantry_core::SyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] pantry_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("Sync failed: {0}")]
    Sync(#[from] SyncError),
    #[error("Item name cannot be empty")]
    EmptyName,
    #[error("Item ID cannot be empty")]
    EmptyItemId,
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Item not found for id/prefix: {0}")]
    ItemNotFound(String),
    #[error("{0}")]
    AmbiguousItemId(String),
    #[error(
        "Cloud sync is not configured. Set PANTRY_SUPABASE_URL and PANTRY_SUPABASE_ANON_KEY or add them to the settings file."
    )]
    SyncNotConfigured,
    #[error("Not signed in. Run `pantry auth login` first.")]
    NotSignedIn,
}
