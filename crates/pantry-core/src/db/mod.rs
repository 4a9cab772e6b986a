//! libSQL-backed local storage for Pantry

mod connection;
mod migrations;
mod persistence;

pub use connection::Database;
pub use persistence::LibSqlRecordPersistence;
