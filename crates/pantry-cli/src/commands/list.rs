use pantry_core::store::{ExpiryWindow, ItemFilter, ItemSort};
use pantry_core::{FoodCategory, ItemTag};

use crate::app::App;
use crate::cli::SortOrder;
use crate::commands::common::{
    format_item_lines, item_to_list_item, now_ms, ItemListItem, DAY_MS,
};
use crate::error::CliError;

#[derive(Debug, Default)]
pub struct ListOptions {
    pub category: Option<FoodCategory>,
    pub tag: Option<ItemTag>,
    pub expiring_days: Option<i64>,
    pub expired: bool,
    pub query: Option<String>,
}

pub fn build_filter(options: &ListOptions) -> ItemFilter {
    let expiry = if options.expired {
        Some(ExpiryWindow::Expired)
    } else {
        options
            .expiring_days
            .map(|days| ExpiryWindow::Within(days.saturating_mul(DAY_MS)))
    };

    ItemFilter {
        category: options.category,
        tag: options.tag,
        expiry,
        query: options.query.clone(),
    }
}

pub const fn item_sort(order: SortOrder) -> ItemSort {
    match order {
        SortOrder::Expiry => ItemSort::ExpiresSoonest,
        SortOrder::Newest => ItemSort::NewestFirst,
        SortOrder::Name => ItemSort::Name,
    }
}

pub fn run_list(
    options: &ListOptions,
    order: SortOrder,
    as_json: bool,
    app: &App,
) -> Result<(), CliError> {
    let now = now_ms();
    let items = app.store.list(&build_filter(options), item_sort(order), now);

    if as_json {
        let json_items = items
            .iter()
            .map(|item| item_to_list_item(item, now))
            .collect::<Vec<ItemListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if items.is_empty() {
        println!("No items.");
    } else {
        for line in format_item_lines(&items, now) {
            println!("{line}");
        }
    }

    Ok(())
}
