use std::path::Path;

use pantry_core::export::{render_inventory_export, ExportFormat as CoreExportFormat};
use pantry_core::store::{sort_items, ItemSort};

use crate::app::App;
use crate::cli::ExportFormat;
use crate::error::CliError;

pub fn run_export(
    format: ExportFormat,
    output_path: Option<&Path>,
    app: &App,
) -> Result<(), CliError> {
    let mut items = app.store.snapshot();
    sort_items(&mut items, ItemSort::ExpiresSoonest);

    let format = match format {
        ExportFormat::Json => CoreExportFormat::Json,
        ExportFormat::Markdown => CoreExportFormat::Markdown,
    };
    let rendered = render_inventory_export(&items, format)?;

    if let Some(path) = output_path {
        std::fs::write(path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}
