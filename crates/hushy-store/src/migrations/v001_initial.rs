//! v1: timestamped JSON values and link previews.

use rusqlite::Connection;

const SQL: &str = r#"
CREATE TABLE IF NOT EXISTS kv_cache (
    key        TEXT PRIMARY KEY NOT NULL,
    value      TEXT NOT NULL,     -- JSON
    stored_at  TEXT NOT NULL      -- RFC-3339
);

-- keyed by the blake3 hash of the normalized URL
CREATE TABLE IF NOT EXISTS link_previews (
    key        TEXT PRIMARY KEY NOT NULL,
    url        TEXT NOT NULL,
    json       TEXT NOT NULL,
    fetched_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_link_previews_fetched_at
    ON link_previews(fetched_at);
"#;

pub fn up(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SQL)
}
