//! Schema upgrades, tracked with `PRAGMA user_version`.
//!
//! [`MIGRATIONS`] lists every step in order. Each pending step runs in its
//! own transaction together with the version bump, so an interrupted
//! upgrade never leaves a half-applied schema behind.

pub mod v001_initial;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type Step = fn(&Connection) -> rusqlite::Result<()>;

/// `(version reached, name, step)`, ascending.
const MIGRATIONS: &[(u32, &str, Step)] = &[(1, "initial", v001_initial::up)];

/// Schema version this build writes.
pub const CURRENT_VERSION: u32 = 1;

pub fn schema_version(conn: &Connection) -> Result<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Bring the schema up to [`CURRENT_VERSION`].
///
/// A cache written by a newer build is refused rather than downgraded.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let found = schema_version(conn)?;
    if found > CURRENT_VERSION {
        return Err(StoreError::SchemaTooNew {
            found,
            supported: CURRENT_VERSION,
        });
    }

    for &(version, name, step) in MIGRATIONS.iter().filter(|(v, _, _)| *v > found) {
        tracing::info!(version, name, "applying cache migration");
        let tx = conn.unchecked_transaction()?;
        step(&tx).map_err(|source| StoreError::Migration { version, source })?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
    }

    Ok(())
}
