use crate::app::App;
use crate::commands::common::{normalize_item_identifier, resolve_item};
use crate::error::CliError;

pub async fn run_remove(id: &str, app: &App) -> Result<(), CliError> {
    let normalized_id = normalize_item_identifier(id)?;
    let item = resolve_item(&app.store.snapshot(), &normalized_id)?;

    let mut events = app.store.subscribe();
    app.store.remove(&item.id).await;
    app.mirror_changes(&mut events).await;

    println!("{}", item.id);
    Ok(())
}
