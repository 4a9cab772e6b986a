pub mod add;
pub mod auth_cmd;
pub mod common;
pub mod export;
pub mod list;
pub mod prompts;
pub mod remove;
pub mod sync;
