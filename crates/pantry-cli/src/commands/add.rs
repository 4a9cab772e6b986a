use pantry_core::{FoodCategory, InventoryItem, ItemTag};

use crate::app::App;
use crate::commands::common::{normalize_item_name, now_ms, resolve_expiry};
use crate::error::CliError;

pub struct NewItem<'a> {
    pub name: &'a [String],
    pub category: FoodCategory,
    pub expires: Option<&'a str>,
    pub days: i64,
    pub tags: &'a [ItemTag],
    pub note: Option<&'a str>,
}

pub fn build_item(new_item: &NewItem<'_>, now_ms: i64) -> Result<InventoryItem, CliError> {
    let name = normalize_item_name(new_item.name)?;
    let expires_at = resolve_expiry(new_item.expires, new_item.days, now_ms)?;

    let mut item = InventoryItem::new(name, new_item.category, expires_at);
    for tag in new_item.tags {
        item = item.with_tag(*tag);
    }
    if let Some(note) = new_item.note.map(str::trim).filter(|note| !note.is_empty()) {
        item = item.with_note(note);
    }
    Ok(item)
}

pub async fn run_add(new_item: &NewItem<'_>, app: &App) -> Result<(), CliError> {
    let item = build_item(new_item, now_ms())?;
    let id = item.id;

    let mut events = app.store.subscribe();
    app.store.add(item).await;
    app.mirror_changes(&mut events).await;

    println!("{id}");
    Ok(())
}
