//! Link previews for URLs found in secrets and messages.
//!
//! Lookup order is memory, then the cache database (entries younger than
//! seven days), then the backend. Concurrent requests for the same URL
//! share one fetch. Network attempts are spaced by a global throttle,
//! bounded by a timeout and retried with exponential backoff.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};
use url::Url;

use hushy_shared::api::{LinkPreview, LinkPreviewRequest};
use hushy_shared::constants::LINK_PREVIEW_TTL_DAYS;
use hushy_store::CachedPreview;

use crate::error::ClientError;
use crate::retry::{with_retry, RetryConfig};
use crate::state::Context;
use crate::throttle::RequestThrottle;

type PendingFetch = Shared<BoxFuture<'static, Option<LinkPreview>>>;

const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "igshid", "mc_cid", "mc_eid"];

#[derive(Debug, Clone)]
pub struct LinkPreviewConfig {
    /// Persisted entries older than this are refetched.
    pub ttl: chrono::Duration,
    /// Minimum spacing between two requests.
    pub min_interval: Duration,
    /// Bound on a single attempt.
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for LinkPreviewConfig {
    fn default() -> Self {
        Self {
            ttl: chrono::Duration::days(LINK_PREVIEW_TTL_DAYS),
            min_interval: Duration::from_millis(
                hushy_shared::constants::LINK_PREVIEW_MIN_INTERVAL_MS,
            ),
            timeout: Duration::from_secs(hushy_shared::constants::LINK_PREVIEW_TIMEOUT_SECS),
            retry: RetryConfig::default(),
        }
    }
}

/// A preview held in memory with the time it was fetched from the backend.
#[derive(Clone)]
struct MemoryEntry {
    preview: LinkPreview,
    fetched_at: DateTime<Utc>,
}

#[derive(Default)]
struct PreviewCache {
    memory: HashMap<String, MemoryEntry>,
    in_flight: HashMap<String, PendingFetch>,
}

impl PreviewCache {
    /// Fresh memory entry for `key`. A stale one is evicted.
    fn fresh(&mut self, key: &str, ttl: chrono::Duration) -> Option<LinkPreview> {
        let entry = self.memory.get(key)?;
        if Utc::now().signed_duration_since(entry.fetched_at) < ttl {
            return Some(entry.preview.clone());
        }
        debug!(key, "evicting stale in-memory link preview");
        self.memory.remove(key);
        None
    }

    fn remember(&mut self, key: String, preview: LinkPreview, fetched_at: DateTime<Utc>) {
        self.memory.insert(key, MemoryEntry { preview, fetched_at });
    }

    fn prune(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.memory.len();
        self.memory.retain(|_, entry| entry.fetched_at >= cutoff);
        before - self.memory.len()
    }
}

struct Inner {
    ctx: Context,
    config: LinkPreviewConfig,
    throttle: RequestThrottle,
    cache: Mutex<PreviewCache>,
}

#[derive(Clone)]
pub struct LinkPreviewService {
    inner: Arc<Inner>,
}

impl LinkPreviewService {
    pub fn new(ctx: Context, config: LinkPreviewConfig) -> Self {
        let throttle = RequestThrottle::new(config.min_interval);
        Self {
            inner: Arc::new(Inner {
                ctx,
                config,
                throttle,
                cache: Mutex::new(PreviewCache::default()),
            }),
        }
    }

    /// Preview for `raw_url`, or `None` when the URL is unusable or the
    /// backend could not produce one. Entries older than the configured TTL
    /// are refetched, whichever tier holds them.
    pub async fn get_preview(&self, raw_url: &str) -> Option<LinkPreview> {
        let Some(normalized) = normalize_url(raw_url) else {
            debug!(url = raw_url, "not a previewable URL");
            return None;
        };
        let key = cache_key(&normalized);
        let ttl = self.inner.config.ttl;

        let memory_hit = self.inner.cache.lock().ok()?.fresh(&key, ttl);
        if memory_hit.is_some() {
            return memory_hit;
        }

        if let Some(cached) = self.inner.load_persisted(&key) {
            if let Ok(mut cache) = self.inner.cache.lock() {
                // keep the row's age so expiry is the same in memory
                cache.remember(key.clone(), cached.preview.clone(), cached.fetched_at);
            }
            return Some(cached.preview);
        }

        let pending = {
            let mut cache = self.inner.cache.lock().ok()?;
            // A fetch may have completed since the first lookup.
            if let Some(hit) = cache.fresh(&key, ttl) {
                return Some(hit);
            }
            match cache.in_flight.get(&key) {
                Some(pending) => {
                    debug!(url = %normalized, "joining in-flight preview fetch");
                    pending.clone()
                }
                None => {
                    let inner = self.inner.clone();
                    let fetch_key = key.clone();
                    let pending = async move { inner.fetch_and_store(fetch_key, normalized).await }
                        .boxed()
                        .shared();
                    cache.in_flight.insert(key, pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Number of fetches currently running.
    pub fn in_flight(&self) -> usize {
        self.inner
            .cache
            .lock()
            .map(|c| c.in_flight.len())
            .unwrap_or(0)
    }

    /// Drop previews past their expiry, in memory and on disk. Returns how
    /// many persisted rows went.
    pub fn purge_expired(&self) -> usize {
        let cutoff = Utc::now() - self.inner.config.ttl;
        if let Ok(mut cache) = self.inner.cache.lock() {
            let evicted = cache.prune(cutoff);
            if evicted > 0 {
                debug!(evicted, "pruned in-memory link previews");
            }
        }
        self.inner
            .ctx
            .with_db("purge link previews", |db| db.purge_link_previews_before(cutoff))
            .unwrap_or(0)
    }
}

impl Inner {
    fn load_persisted(&self, key: &str) -> Option<CachedPreview> {
        let cached = self
            .ctx
            .with_db("load link preview", |db| db.get_link_preview(key))
            .flatten()?;

        if cached.is_fresh(Utc::now(), self.config.ttl) {
            Some(cached)
        } else {
            debug!(url = %cached.url, fetched_at = %cached.fetched_at, "stale link preview");
            None
        }
    }

    async fn fetch_and_store(self: Arc<Self>, key: String, url: String) -> Option<LinkPreview> {
        let result = with_retry(&self.config.retry, ClientError::is_retryable, || async {
            self.throttle.acquire().await;
            self.ctx
                .api
                .post_with_timeout::<LinkPreview, _>(
                    "/api/link-preview",
                    &LinkPreviewRequest { url: &url },
                    self.config.timeout,
                )
                .await
        })
        .await;

        let fetched_at = Utc::now();
        let preview = match result {
            Ok(preview) => {
                info!(url = %url, "link preview fetched");
                self.ctx.with_db("store link preview", |db| {
                    db.put_link_preview(&key, &url, &preview, fetched_at)
                });
                Some(preview)
            }
            Err(e) => {
                warn!(url = %url, error = %e, "link preview unavailable");
                None
            }
        };

        if let Ok(mut cache) = self.cache.lock() {
            if let Some(preview) = &preview {
                cache.remember(key.clone(), preview.clone(), fetched_at);
            }
            cache.in_flight.remove(&key);
        }

        preview
    }
}

/// Canonical form of a URL for caching: scheme defaulted to https, host
/// lowercased, fragment, tracking parameters and trailing slash removed.
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let mut url = Url::parse(&with_scheme).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| {
            let name: &str = k;
            !name.starts_with("utm_") && !TRACKING_PARAMS.contains(&name)
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    Some(url.to_string())
}

pub fn cache_key(normalized: &str) -> String {
    hex::encode(blake3::hash(normalized.as_bytes()).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_scheme_and_lowercases_host() {
        assert_eq!(
            normalize_url("  Example.COM/Path ").as_deref(),
            Some("https://example.com/Path")
        );
    }

    #[test]
    fn strips_fragment_tracking_and_trailing_slash() {
        assert_eq!(
            normalize_url("https://example.com/a/b/?utm_source=x&id=3&fbclid=y#top").as_deref(),
            Some("https://example.com/a/b?id=3")
        );
        assert_eq!(
            normalize_url("http://example.com/?utm_medium=social").as_deref(),
            Some("http://example.com/")
        );
    }

    #[test]
    fn equivalent_urls_share_a_key() {
        let a = normalize_url("example.com/post#comments").unwrap();
        let b = normalize_url("https://EXAMPLE.com/post/?utm_campaign=z").unwrap();
        assert_eq!(cache_key(&a), cache_key(&b));
        assert_eq!(cache_key(&a).len(), 64);
    }

    fn preview(title: &str) -> LinkPreview {
        LinkPreview {
            url: "https://example.com".into(),
            title: Some(title.into()),
            description: None,
            image: None,
            site_name: None,
        }
    }

    #[test]
    fn stale_memory_entry_is_evicted() {
        let ttl = chrono::Duration::days(7);
        let mut cache = PreviewCache::default();
        cache.remember("old".into(), preview("old"), Utc::now() - chrono::Duration::days(8));
        cache.remember("new".into(), preview("new"), Utc::now() - chrono::Duration::days(6));

        assert!(cache.fresh("old", ttl).is_none());
        assert!(!cache.memory.contains_key("old"));
        assert_eq!(cache.fresh("new", ttl).unwrap().title.as_deref(), Some("new"));
    }

    #[test]
    fn prune_drops_entries_before_cutoff() {
        let mut cache = PreviewCache::default();
        let now = Utc::now();
        cache.remember("a".into(), preview("a"), now - chrono::Duration::days(9));
        cache.remember("b".into(), preview("b"), now - chrono::Duration::days(8));
        cache.remember("c".into(), preview("c"), now);

        assert_eq!(cache.prune(now - chrono::Duration::days(7)), 2);
        assert_eq!(cache.memory.len(), 1);
    }

    #[test]
    fn rejects_unusable_urls() {
        assert_eq!(normalize_url(""), None);
        assert_eq!(normalize_url("   "), None);
        assert_eq!(normalize_url("ftp://example.com/file"), None);
        assert_eq!(normalize_url("javascript:alert(1)"), None);
        assert_eq!(normalize_url("https://exa mple.com"), None);
    }
}
