use thiserror::Error;

/// Failures of the local cache. Callers treat all of them as a cache miss.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// No platform cache directory (e.g. `$HOME` unset).
    #[error("no cache directory available on this platform")]
    NoDataDir,

    #[error("cache directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("migration to v{version} failed: {source}")]
    Migration {
        version: u32,
        #[source]
        source: rusqlite::Error,
    },

    #[error("cache schema v{found} is newer than supported v{supported}")]
    SchemaTooNew { found: u32, supported: u32 },

    /// A cached value no longer matches its Rust type.
    #[error("cached value: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cached timestamp: {0}")]
    ChronoParse(#[from] chrono::ParseError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
