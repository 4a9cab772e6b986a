//! Cloud sync settings.
//!
//! Read from an optional JSON file, then overridden by `PANTRY_*` environment
//! variables. Sync is disabled when neither source names a Supabase project.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

pub const DEFAULT_REMOTE_TABLE: &str = "inventory_items";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

pub const ENV_SUPABASE_URL: &str = "PANTRY_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "PANTRY_SUPABASE_ANON_KEY";
pub const ENV_REMOTE_TABLE: &str = "PANTRY_REMOTE_TABLE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SyncSettings {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    #[serde(default = "default_remote_table")]
    pub remote_table: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_anon_key: None,
            remote_table: default_remote_table(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SyncSettings {
    /// Load `path` (if it exists), apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = match std::fs::read_to_string(path) {
            Ok(raw) => Self::parse(&raw)?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(error) => return Err(error.into()),
        };
        settings
            .with_overrides(|key| std::env::var(key).ok())
            .validated()
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Apply overrides from `lookup`, keyed by the `PANTRY_*` variable names.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = normalize_text_option(lookup(ENV_SUPABASE_URL)) {
            self.supabase_url = Some(url);
        }
        if let Some(key) = normalize_text_option(lookup(ENV_SUPABASE_ANON_KEY)) {
            self.supabase_anon_key = Some(key);
        }
        if let Some(table) = normalize_text_option(lookup(ENV_REMOTE_TABLE)) {
            self.remote_table = table;
        }
        self
    }

    /// Normalize values and reject half-configured or malformed settings.
    pub fn validated(mut self) -> Result<Self> {
        self.supabase_url = normalize_text_option(self.supabase_url.take())
            .map(|url| url.trim_end_matches('/').to_string());
        self.supabase_anon_key = normalize_text_option(self.supabase_anon_key.take());
        self.remote_table = self.remote_table.trim().to_string();

        match (&self.supabase_url, &self.supabase_anon_key) {
            (Some(url), Some(_)) if !is_http_url(url) => {
                return Err(Error::InvalidInput(
                    "supabase_url must include http:// or https://".to_string(),
                ));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(Error::InvalidInput(
                    "supabase_url and supabase_anon_key must be set together".to_string(),
                ));
            }
            _ => {}
        }
        if self.remote_table.is_empty() {
            return Err(Error::InvalidInput(
                "remote_table must not be empty".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::InvalidInput(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }

    /// URL and anon key, when cloud sync is configured.
    pub fn supabase(&self) -> Option<(&str, &str)> {
        Some((
            self.supabase_url.as_deref()?,
            self.supabase_anon_key.as_deref()?,
        ))
    }

    pub fn is_sync_enabled(&self) -> bool {
        self.supabase().is_some()
    }
}

fn default_remote_table() -> String {
    DEFAULT_REMOTE_TABLE.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
