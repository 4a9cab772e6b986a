//! pantry-core - Core library for Pantry
//!
//! This crate contains the inventory models, the local store and its
//! persistence backends, and the cloud sync machinery (remote client, merge
//! engine, sync coordinator) shared by every Pantry interface.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod merge;
pub mod models;
pub mod persistence;
pub mod reminders;
pub mod remote;
pub mod store;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{FoodCategory, InventoryItem, ItemId, ItemTag};
pub use store::LocalStore;
pub use sync::{SyncCoordinator, SyncError, SyncOutcome};
