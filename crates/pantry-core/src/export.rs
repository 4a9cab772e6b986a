//! Inventory export rendering.

use std::fmt::Write as _;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::models::{FoodCategory, InventoryItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

/// Flat, stable representation of an item for export files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportItem {
    pub id: String,
    pub name: String,
    pub category: FoodCategory,
    pub tags: Vec<String>,
    pub expires_at: i64,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[must_use]
pub fn item_to_export(item: &InventoryItem) -> ExportItem {
    ExportItem {
        id: item.id.to_string(),
        name: item.name.clone(),
        category: item.category,
        // BTreeSet iteration is already ordered
        tags: item.tags.iter().map(ToString::to_string).collect(),
        expires_at: item.expires_at,
        created_at: item.created_at,
        note: item.note.clone(),
    }
}

pub fn render_json_export(items: &[InventoryItem]) -> serde_json::Result<String> {
    let items = items.iter().map(item_to_export).collect::<Vec<_>>();
    serde_json::to_string_pretty(&items)
}

/// Markdown checklist grouped by category, soonest expiry first within a group.
#[must_use]
pub fn render_markdown_export(items: &[InventoryItem]) -> String {
    let mut output = String::from("# Pantry inventory\n");

    for category in FoodCategory::ALL {
        let mut group: Vec<&InventoryItem> = items
            .iter()
            .filter(|item| item.category == category)
            .collect();
        if group.is_empty() {
            continue;
        }
        group.sort_by(|a, b| a.expires_at.cmp(&b.expires_at).then(a.id.cmp(&b.id)));

        let _ = writeln!(output);
        let _ = writeln!(output, "## {category}");
        let _ = writeln!(output);
        for item in group {
            let _ = write!(
                output,
                "- [ ] {} (expires {})",
                item.name,
                format_date(item.expires_at)
            );
            if !item.tags.is_empty() {
                let tags = item
                    .tags
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                let _ = write!(output, " [{tags}]");
            }
            if let Some(note) = &item.note {
                let _ = write!(output, ": {note}");
            }
            output.push('\n');
        }
    }

    output
}

pub fn render_inventory_export(
    items: &[InventoryItem],
    format: ExportFormat,
) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(items),
        ExportFormat::Markdown => Ok(render_markdown_export(items)),
    }
}

fn format_date(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date| date.format("%Y-%m-%d").to_string(),
    )
}
