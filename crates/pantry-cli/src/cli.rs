use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use pantry_core::{FoodCategory, ItemTag};

#[derive(Parser)]
#[command(name = "pantry")]
#[command(about = "Track perishable food and back it up to the cloud")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the local inventory database
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to the sync settings JSON file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add an item to the inventory
    #[command(alias = "new")]
    Add {
        /// Item name
        #[arg(required = true)]
        name: Vec<String>,
        /// Food category
        #[arg(short, long, default_value = "other", value_parser = parse_category)]
        category: FoodCategory,
        /// Expiration date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE", conflicts_with = "days")]
        expires: Option<String>,
        /// Days from now until expiration
        #[arg(long, value_name = "N", default_value = "7")]
        days: i64,
        /// Tags (repeatable)
        #[arg(short, long = "tag", value_parser = parse_tag)]
        tags: Vec<ItemTag>,
        /// Free-text note
        #[arg(long)]
        note: Option<String>,
    },
    /// List inventory items
    List {
        /// Only items in this category
        #[arg(long, value_parser = parse_category)]
        category: Option<FoodCategory>,
        /// Only items carrying this tag
        #[arg(long, value_parser = parse_tag)]
        tag: Option<ItemTag>,
        /// Only items expiring within this many days
        #[arg(long, value_name = "DAYS", conflicts_with = "expired")]
        expiring: Option<i64>,
        /// Only items that have already expired
        #[arg(long)]
        expired: bool,
        /// Case-insensitive name filter
        #[arg(short, long)]
        query: Option<String>,
        /// Sort order
        #[arg(long, value_enum, default_value_t = SortOrder::Expiry)]
        sort: SortOrder,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove an item
    #[command(alias = "rm")]
    Remove {
        /// Item ID or unique ID prefix
        id: String,
    },
    /// Export the inventory
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Sign in or out of cloud backup
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Upload local items and remove cloud items deleted locally
    Sync,
    /// Delete every item stored in the cloud for the signed-in account
    WipeRemote {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with email/password and store the session in the keychain
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
        #[command(flatten)]
        answer: PromptAnswer,
    },
    /// Show whether a session is stored
    Status,
    /// Sign out and forget the stored session
    Logout {
        #[command(flatten)]
        answer: PromptAnswer,
    },
}

/// Pre-answer the follow-up question asked after signing in or out.
#[derive(clap::Args, Clone, Copy, Debug, Default)]
pub struct PromptAnswer {
    /// Answer yes to the follow-up question
    #[arg(long, conflicts_with = "no")]
    pub yes: bool,
    /// Answer no to the follow-up question
    #[arg(long)]
    pub no: bool,
}

impl PromptAnswer {
    pub const fn preset(self) -> Option<bool> {
        if self.yes {
            Some(true)
        } else if self.no {
            Some(false)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SortOrder {
    Expiry,
    Newest,
    Name,
}

fn parse_category(raw: &str) -> Result<FoodCategory, String> {
    raw.parse()
}

fn parse_tag(raw: &str) -> Result<ItemTag, String> {
    raw.parse()
}
