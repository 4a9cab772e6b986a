use chrono::{NaiveDate, Utc};
use pantry_core::{InventoryItem, ItemId};
use serde::Serialize;

use crate::error::CliError;

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Serialize)]
pub struct ItemListItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub tags: Vec<String>,
    pub expires_at: i64,
    pub expires_in: String,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn normalize_item_name(parts: &[String]) -> Result<String, CliError> {
    let name = parts.join(" ");
    let name = name.trim();
    if name.is_empty() {
        Err(CliError::EmptyName)
    } else {
        Ok(name.to_string())
    }
}

pub fn normalize_item_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyItemId)
    } else {
        Ok(trimmed.to_ascii_lowercase())
    }
}

/// Expiry timestamp from an explicit date (end of that day, UTC) or a day
/// offset from `now_ms`.
pub fn resolve_expiry(date: Option<&str>, days: i64, now_ms: i64) -> Result<i64, CliError> {
    let Some(date) = date else {
        return Ok(now_ms.saturating_add(days.saturating_mul(DAY_MS)));
    };

    let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| CliError::InvalidDate(date.trim().to_string()))?;
    parsed
        .and_hms_milli_opt(23, 59, 59, 999)
        .map(|end_of_day| end_of_day.and_utc().timestamp_millis())
        .ok_or_else(|| CliError::InvalidDate(date.trim().to_string()))
}

/// Find an item by full id or unique id prefix.
pub fn resolve_item(items: &[InventoryItem], query: &str) -> Result<InventoryItem, CliError> {
    if let Ok(id) = query.parse::<ItemId>() {
        if let Some(item) = items.iter().find(|item| item.id == id) {
            return Ok(item.clone());
        }
    }

    let matches = items
        .iter()
        .filter(|item| item.id.to_string().starts_with(query))
        .collect::<Vec<_>>();

    match matches.as_slice() {
        [] => Err(CliError::ItemNotFound(query.to_string())),
        [item] => Ok((*item).clone()),
        several => {
            let options = several
                .iter()
                .take(3)
                .map(|item| short_id(&item.id))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousItemId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: &ItemId) -> String {
    id.to_string().chars().take(13).collect()
}

pub fn format_item_lines(items: &[InventoryItem], now_ms: i64) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let short_id = short_id(&item.id);
            let name = truncate(&item.name, 28);
            let category = item.category.as_str();
            let expiry = format_relative_expiry(item.expires_at, now_ms);
            let tags = render_tags(item);

            if tags.is_empty() {
                format!("{short_id:<13}  {name:<28}  {category:<10}  {expiry}")
            } else {
                format!("{short_id:<13}  {name:<28}  {category:<10}  {expiry:<16}  {tags}")
            }
        })
        .collect()
}

pub fn item_to_list_item(item: &InventoryItem, now_ms: i64) -> ItemListItem {
    ItemListItem {
        id: item.id.to_string(),
        name: item.name.clone(),
        category: item.category.to_string(),
        tags: item.tags.iter().map(ToString::to_string).collect(),
        expires_at: item.expires_at,
        expires_in: format_relative_expiry(item.expires_at, now_ms),
        created_at: item.created_at,
        note: item.note.clone(),
    }
}

pub fn format_relative_expiry(expires_at: i64, now_ms: i64) -> String {
    let diff = expires_at.saturating_sub(now_ms);
    if diff <= 0 {
        let days = now_ms.saturating_sub(expires_at) / DAY_MS;
        return match days {
            0 => "expired today".to_string(),
            1 => "expired 1d ago".to_string(),
            days => format!("expired {days}d ago"),
        };
    }

    let days = diff / DAY_MS;
    match days {
        0 => "expires today".to_string(),
        1 => "in 1 day".to_string(),
        days if days < 60 => format!("in {days} days"),
        days => format!("in {}mo", days / 30),
    }
}

fn render_tags(item: &InventoryItem) -> String {
    item.tags
        .iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated = value
        .chars()
        .take(max_chars.saturating_sub(3))
        .collect::<String>();
    truncated.push_str("...");
    truncated
}
