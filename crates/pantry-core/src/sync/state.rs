//! Observable coordinator state and sync results.

use thiserror::Error;

use crate::remote::RemoteError;

/// Confirmation the user is asked for after an auth transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptKind {
    /// Logged in with local items: merge them into the account?
    UploadLocalData,
    /// Logged out with local items: wipe them from this device?
    DeleteLocalData,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncStatus {
    pub is_syncing: bool,
    pub pending_prompt: Option<PromptKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("Not signed in")]
    Unauthenticated,
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("Local storage unavailable: {0}")]
    PersistenceUnavailable(String),
    #[error("Sync coordinator has no local store")]
    StoreNotInjected,
    #[error("A sync is already in progress")]
    SyncInProgress,
    #[error("No prompt is pending")]
    NoPendingPrompt,
}

impl From<RemoteError> for SyncError {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::Unauthenticated => Self::Unauthenticated,
            RemoteError::Unavailable(message)
            | RemoteError::InvalidConfiguration(message)
            | RemoteError::Api(message) => Self::RemoteUnavailable(message),
            RemoteError::Http(error) => Self::RemoteUnavailable(error.to_string()),
        }
    }
}

impl From<crate::Error> for SyncError {
    fn from(error: crate::Error) -> Self {
        Self::PersistenceUnavailable(error.to_string())
    }
}

/// Result of one coordinator operation: a success flag plus the error, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub success: bool,
    pub error: Option<SyncError>,
}

impl SyncOutcome {
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    #[must_use]
    pub const fn failed(error: SyncError) -> Self {
        Self {
            success: false,
            error: Some(error),
        }
    }

    pub fn into_result(self) -> Result<(), SyncError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl From<Result<(), SyncError>> for SyncOutcome {
    fn from(result: Result<(), SyncError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(error) => Self::failed(error),
        }
    }
}
