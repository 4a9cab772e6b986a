//! Supabase PostgREST table backend.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use super::{RemoteDatabase, RemoteError, RemoteRecord, RemoteResult, RemoteScope};
use crate::auth::parse_api_error;
use crate::config::SyncSettings;
use crate::models::{FoodCategory, InventoryItem, ItemId, ItemTag};
use crate::util::is_http_url;

/// Rows requested per fetch page. Must not exceed the project's PostgREST
/// `max-rows`, or a capped page would read as the last one.
const FETCH_PAGE_SIZE: usize = 1000;

#[derive(Clone)]
pub struct RestRemoteDatabase {
    table_url: String,
    anon_key: String,
    client: Client,
    page_size: usize,
}

impl RestRemoteDatabase {
    pub fn new(
        supabase_url: &str,
        anon_key: impl Into<String>,
        table: &str,
        timeout: Duration,
    ) -> RemoteResult<Self> {
        let table_url = normalize_table_url(supabase_url, table)?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(RemoteError::InvalidConfiguration(
                "Supabase anon key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            table_url,
            anon_key,
            client: Client::builder().timeout(timeout).build()?,
            page_size: FETCH_PAGE_SIZE,
        })
    }

    #[cfg(test)]
    fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn from_settings(settings: &SyncSettings) -> RemoteResult<Self> {
        let (url, anon_key) = settings.supabase().ok_or_else(|| {
            RemoteError::InvalidConfiguration("Supabase is not configured".to_string())
        })?;
        Self::new(
            url,
            anon_key,
            &settings.remote_table,
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    fn authorized(&self, request: RequestBuilder, scope: &RemoteScope) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&scope.access_token)
            .header("Accept", "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = request.send().await.map_err(|error| {
            if error.is_timeout() || error.is_connect() {
                RemoteError::Unavailable(error.to_string())
            } else {
                RemoteError::Http(error)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthenticated,
            status if status.is_server_error() => {
                RemoteError::Unavailable(parse_api_error(status, &body))
            }
            status => RemoteError::Api(parse_api_error(status, &body)),
        })
    }
}

#[async_trait]
impl RemoteDatabase for RestRemoteDatabase {
    async fn upsert(&self, scope: &RemoteScope, items: &[InventoryItem]) -> RemoteResult<()> {
        let rows: Vec<UpsertRow<'_>> = items
            .iter()
            .map(|item| UpsertRow::new(&scope.user_id, item))
            .collect();

        let request = self.authorized(
            self.client
                .post(&self.table_url)
                .query(&[("on_conflict", "id")])
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(&rows),
            scope,
        );
        self.send(request).await?;
        Ok(())
    }

    /// Reads page by page until a short page comes back.
    async fn fetch_all(&self, scope: &RemoteScope) -> RemoteResult<Vec<RemoteRecord>> {
        let user_filter = format!("eq.{}", scope.user_id);
        let limit = self.page_size.to_string();
        let mut records = Vec::new();

        loop {
            let offset = records.len().to_string();
            let request = self.authorized(
                self.client.get(&self.table_url).query(&[
                    ("select", "*"),
                    ("user_id", user_filter.as_str()),
                    ("order", "created_at.asc,id.asc"),
                    ("limit", limit.as_str()),
                    ("offset", offset.as_str()),
                ]),
                scope,
            );

            let page = self.send(request).await?.json::<Vec<FetchedRow>>().await?;
            let last_page = page.len() < self.page_size;
            records.extend(page.into_iter().map(RemoteRecord::from));
            if last_page {
                return Ok(records);
            }
        }
    }

    async fn delete(&self, scope: &RemoteScope, id: &ItemId) -> RemoteResult<()> {
        let id_filter = format!("eq.{id}");
        let user_filter = format!("eq.{}", scope.user_id);
        let request = self.authorized(
            self.client
                .delete(&self.table_url)
                .query(&[("id", id_filter.as_str()), ("user_id", user_filter.as_str())])
                .header("Prefer", "return=minimal"),
            scope,
        );
        self.send(request).await?;
        Ok(())
    }

    async fn delete_all(&self, scope: &RemoteScope) -> RemoteResult<usize> {
        let user_filter = format!("eq.{}", scope.user_id);
        let request = self.authorized(
            self.client
                .delete(&self.table_url)
                .query(&[("user_id", user_filter.as_str()), ("select", "id")])
                .header("Prefer", "return=representation"),
            scope,
        );

        let deleted = self.send(request).await?.json::<Vec<IgnoredAny>>().await?;
        Ok(deleted.len())
    }
}

fn normalize_table_url(supabase_url: &str, table: &str) -> RemoteResult<String> {
    let base = supabase_url.trim().trim_end_matches('/');
    if !is_http_url(base) {
        return Err(RemoteError::InvalidConfiguration(
            "Supabase URL must include http:// or https://".to_string(),
        ));
    }
    let table = table.trim();
    if table.is_empty()
        || !table
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    {
        return Err(RemoteError::InvalidConfiguration(format!(
            "invalid remote table name: {table:?}"
        )));
    }
    let base = base.trim_end_matches("/rest/v1");
    Ok(format!("{base}/rest/v1/{table}"))
}

/// Row body for upserts. Every key is always present so PostgREST sees one
/// column set for the whole batch; `updated_at` is left to the server.
#[derive(Debug, Serialize)]
struct UpsertRow<'a> {
    id: ItemId,
    user_id: &'a str,
    name: &'a str,
    category: FoodCategory,
    tags: &'a BTreeSet<ItemTag>,
    expires_at: i64,
    created_at: i64,
    note: Option<&'a str>,
}

impl<'a> UpsertRow<'a> {
    fn new(user_id: &'a str, item: &'a InventoryItem) -> Self {
        Self {
            id: item.id,
            user_id,
            name: &item.name,
            category: item.category,
            tags: &item.tags,
            expires_at: item.expires_at,
            created_at: item.created_at,
            note: item.note.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FetchedRow {
    id: ItemId,
    user_id: String,
    name: String,
    category: FoodCategory,
    #[serde(default)]
    tags: BTreeSet<ItemTag>,
    expires_at: i64,
    created_at: i64,
    note: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<FetchedRow> for RemoteRecord {
    fn from(row: FetchedRow) -> Self {
        Self {
            user_id: row.user_id,
            item: InventoryItem {
                id: row.id,
                name: row.name,
                category: row.category,
                tags: row.tags,
                expires_at: row.expires_at,
                created_at: row.created_at,
                note: row.note,
            },
            updated_at: row.updated_at,
        }
    }
}
