//! Database module: models, schema and the SQLite-backed [`Storage`].
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `params.rs`: create / patch / filter payloads
//! - `schema.rs`: SQL DDL for initializing the database
//! - `sqlite.rs`: pool setup, seeding, ownership and numbering helpers
//! - one file per entity with its `impl Storage` queries

pub mod analytics;
pub mod appointments;
pub mod cases;
pub mod chat;
pub mod clients;
pub mod documents;
pub mod invoices;
pub mod models;
pub mod params;
pub mod predefined;
pub mod profiles;
pub mod prompts;
pub mod schema;
pub mod settings;
pub mod sqlite;

pub use models::Tenant;
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, Storage};
