use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::database::Database;
use crate::error::Result;
use crate::models::KvEntry;

impl Database {
    /// Store `value` as JSON under `key`, stamped with the current time.
    /// An existing entry is replaced.
    pub fn kv_put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.kv_put_at(key, value, Utc::now())
    }

    /// Like [`Database::kv_put`] with an explicit write time.
    pub fn kv_put_at<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        stored_at: DateTime<Utc>,
    ) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.conn().execute(
            "INSERT OR REPLACE INTO kv_cache (key, value, stored_at) VALUES (?1, ?2, ?3)",
            params![key, json, stored_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Entry under `key` with its write time, or `None` if absent.
    pub fn kv_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<KvEntry<T>>> {
        let row: Option<(String, String)> = self
            .conn()
            .query_row(
                "SELECT value, stored_at FROM kv_cache WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((json, stored_str)) = row else {
            return Ok(None);
        };

        let value: T = serde_json::from_str(&json)?;
        let stored_at = DateTime::parse_from_rfc3339(&stored_str)?.with_timezone(&Utc);

        Ok(Some(KvEntry {
            key: key.to_string(),
            value,
            stored_at,
        }))
    }

    /// Value under `key` if it was written less than `max_age` before `now`.
    pub fn kv_get_fresh<T: DeserializeOwned>(
        &self,
        key: &str,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<T>> {
        Ok(self
            .kv_get(key)?
            .filter(|entry| entry.is_fresh(now, max_age))
            .map(|entry| entry.value))
    }

    /// Remove `key`. Returns `true` if an entry existed.
    pub fn kv_delete(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM kv_cache WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn put_get_delete() {
        let db = Database::open_in_memory().unwrap();
        let value = Sample {
            name: "a".into(),
            count: 2,
        };
        db.kv_put("sample", &value).unwrap();

        let entry: KvEntry<Sample> = db.kv_get("sample").unwrap().unwrap();
        assert_eq!(entry.value, value);

        assert!(db.kv_delete("sample").unwrap());
        assert!(!db.kv_delete("sample").unwrap());
        assert!(db.kv_get::<Sample>("sample").unwrap().is_none());
    }

    #[test]
    fn put_overwrites() {
        let db = Database::open_in_memory().unwrap();
        db.kv_put("k", &1u32).unwrap();
        db.kv_put("k", &2u32).unwrap();
        assert_eq!(db.kv_get::<u32>("k").unwrap().unwrap().value, 2);
    }

    #[test]
    fn stale_values_are_filtered() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        db.kv_put_at("old", &"x", now - Duration::hours(25)).unwrap();
        db.kv_put_at("new", &"y", now - Duration::hours(1)).unwrap();

        let old: Option<String> = db.kv_get_fresh("old", Duration::hours(24), now).unwrap();
        let new: Option<String> = db.kv_get_fresh("new", Duration::hours(24), now).unwrap();
        assert_eq!(old, None);
        assert_eq!(new.as_deref(), Some("y"));
    }

    #[test]
    fn type_mismatch_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        db.kv_put("k", &"not a number").unwrap();
        assert!(db.kv_get::<u32>("k").is_err());
    }
}
