//! Records kept in the local cache database.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use hushy_shared::api::LinkPreview;

/// A value read back from `kv_cache` together with its write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvEntry<T> {
    pub key: String,
    pub value: T,
    pub stored_at: DateTime<Utc>,
}

impl<T> KvEntry<T> {
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now.signed_duration_since(self.stored_at) < max_age
    }
}

/// A persisted link preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPreview {
    pub key: String,
    pub url: String,
    pub preview: LinkPreview,
    pub fetched_at: DateTime<Utc>,
}

impl CachedPreview {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.fetched_at) < ttl
    }
}
