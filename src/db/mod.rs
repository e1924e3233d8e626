//! Database module: the embedded SQLite file and typed access to its tables.
//!
//! Layout:
//! - `sqlite.rs`: opening/creating the database file, schema, snapshots
//! - `schema.rs`: SQL DDL
//! - `models.rs`: Rust structs mirroring DB rows and request payloads
//! - `accounts.rs`, `fleet.rs`, `maintenance.rs`, `messages.rs`: per-table storage

pub mod accounts;
pub mod fleet;
pub mod maintenance;
pub mod messages;
pub mod models;
pub mod schema;
pub mod sqlite;

pub use accounts::AccountsStorage;
pub use fleet::FleetStorage;
pub use maintenance::MaintenanceStorage;
pub use messages::MessagesStorage;
pub use models::{AccountSummary, DbAccount, Role};
pub use schema::SQLITE_INIT;
pub use sqlite::{LocalDatabase, SqlitePool};
