use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use hushy_shared::api::LinkPreview;

use crate::database::Database;
use crate::error::Result;
use crate::models::CachedPreview;

impl Database {
    /// Insert or replace the preview cached under `key` (the hash of the
    /// normalized `url`).
    pub fn put_link_preview(
        &self,
        key: &str,
        url: &str,
        preview: &LinkPreview,
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        let json = serde_json::to_string(preview)?;
        self.conn().execute(
            "INSERT OR REPLACE INTO link_previews (key, url, json, fetched_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![key, url, json, fetched_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Cached preview for `key`, whatever its age. Freshness is the
    /// caller's call, see [`CachedPreview::is_fresh`].
    pub fn get_link_preview(&self, key: &str) -> Result<Option<CachedPreview>> {
        let row: Option<(String, String, String)> = self
            .conn()
            .query_row(
                "SELECT url, json, fetched_at FROM link_previews WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((url, json, fetched_str)) = row else {
            return Ok(None);
        };

        Ok(Some(CachedPreview {
            key: key.to_string(),
            url,
            preview: serde_json::from_str(&json)?,
            fetched_at: DateTime::parse_from_rfc3339(&fetched_str)?.with_timezone(&Utc),
        }))
    }

    /// Remove one preview. Returns `true` if it existed.
    pub fn delete_link_preview(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM link_previews WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }

    /// Drop every preview fetched before `cutoff`. Returns how many went.
    pub fn purge_link_previews_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        // RFC-3339 strings in UTC sort chronologically.
        let affected = self.conn().execute(
            "DELETE FROM link_previews WHERE fetched_at < ?1",
            params![cutoff.to_rfc3339()],
        )?;
        if affected > 0 {
            tracing::debug!(removed = affected, "purged stale link previews");
        }
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn preview(url: &str) -> LinkPreview {
        LinkPreview {
            url: url.to_string(),
            title: Some("Example".into()),
            description: None,
            image: None,
            site_name: Some("example.com".into()),
        }
    }

    #[test]
    fn stores_and_reads_preview() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        db.put_link_preview("k1", "https://example.com", &preview("https://example.com"), now)
            .unwrap();

        let cached = db.get_link_preview("k1").unwrap().unwrap();
        assert_eq!(cached.preview.title.as_deref(), Some("Example"));
        assert!(cached.is_fresh(now, Duration::days(7)));
        assert!(!cached.is_fresh(now + Duration::days(7), Duration::days(7)));
    }

    #[test]
    fn missing_preview_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_link_preview("nope").unwrap().is_none());
        assert!(!db.delete_link_preview("nope").unwrap());
    }

    #[test]
    fn purge_removes_only_old_rows() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        db.put_link_preview("old", "https://a.io", &preview("https://a.io"), now - Duration::days(8))
            .unwrap();
        db.put_link_preview("new", "https://b.io", &preview("https://b.io"), now)
            .unwrap();

        let removed = db.purge_link_previews_before(now - Duration::days(7)).unwrap();
        assert_eq!(removed, 1);
        assert!(db.get_link_preview("old").unwrap().is_none());
        assert!(db.get_link_preview("new").unwrap().is_some());
    }
}
