//! Pantry CLI - track perishable food from the terminal
//!
//! Works offline against a local database; cloud backup turns on when sync
//! settings are present.

mod app;
mod auth;
mod cli;
mod commands;
mod error;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::cli::{Cli, Commands};
use crate::commands::add::{run_add, NewItem};
use crate::commands::auth_cmd::run_auth;
use crate::commands::export::run_export;
use crate::commands::list::{run_list, ListOptions};
use crate::commands::remove::run_remove;
use crate::commands::sync::{run_sync, run_wipe_remote};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "pantry=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = App::open(cli.data_dir.as_deref(), cli.config.as_deref()).await?;

    match cli.command {
        Commands::Add {
            name,
            category,
            expires,
            days,
            tags,
            note,
        } => {
            let new_item = NewItem {
                name: &name,
                category,
                expires: expires.as_deref(),
                days,
                tags: &tags,
                note: note.as_deref(),
            };
            run_add(&new_item, &app).await
        }
        Commands::List {
            category,
            tag,
            expiring,
            expired,
            query,
            sort,
            json,
        } => {
            let options = ListOptions {
                category,
                tag,
                expiring_days: expiring,
                expired,
                query,
            };
            run_list(&options, sort, json, &app)
        }
        Commands::Remove { id } => run_remove(&id, &app).await,
        Commands::Export { format, output } => run_export(format, output.as_deref(), &app),
        Commands::Auth { command } => run_auth(command, &app).await,
        Commands::Sync => run_sync(&app).await,
        Commands::WipeRemote { yes } => run_wipe_remote(yes, &app).await,
    }
}
