//! # hushy-store
//!
//! Local best-effort cache for the Hushy client, backed by SQLite.
//!
//! Nothing here is authoritative: the backend owns every record. The store
//! keeps timestamped JSON values (session, detected currency, …) and link
//! previews so they survive restarts. The crate exposes a synchronous
//! `Database` handle wrapping a `rusqlite::Connection`.

pub mod database;
pub mod kv;
pub mod migrations;
pub mod models;
pub mod previews;

mod error;

pub use database::Database;
pub use error::{Result as StoreResult, StoreError};
pub use models::*;
