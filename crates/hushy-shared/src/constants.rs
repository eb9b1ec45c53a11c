/// Default backend base URL
pub const DEFAULT_API_URL: &str = "https://api.hushy.app";

/// Public share links are built on this prefix
pub const SHARE_BASE_URL: &str = "https://hushy.app/s";

/// Minimum price of a secret
pub const MIN_SECRET_PRICE: f64 = 3.0;

/// Maximum price of a secret
pub const MAX_SECRET_PRICE: f64 = 999.99;

/// Maximum secret content length in characters
pub const MAX_SECRET_CONTENT_CHARS: usize = 2000;

/// Maximum label length in characters
pub const MAX_LABEL_CHARS: usize = 50;

/// Lifetime of a secret when the poster does not pick one
pub const DEFAULT_SECRET_DURATION_HOURS: u32 = 24;

/// Persisted link previews are stale after this many days
pub const LINK_PREVIEW_TTL_DAYS: i64 = 7;

/// Retries after the first failed preview fetch
pub const LINK_PREVIEW_MAX_RETRIES: u32 = 2;

/// First backoff delay of a preview retry, doubled on each attempt
pub const LINK_PREVIEW_RETRY_BASE_MS: u64 = 1000;

/// Minimum spacing between two preview requests (global)
pub const LINK_PREVIEW_MIN_INTERVAL_MS: u64 = 1000;

/// Per-attempt preview fetch timeout
pub const LINK_PREVIEW_TIMEOUT_SECS: u64 = 10;

/// A notification id seen within this window is dropped
pub const NOTIFICATION_DEDUP_WINDOW_SECS: u64 = 30;

/// Detected currency is cached for this long
pub const CURRENCY_CACHE_TTL_HOURS: i64 = 24;

/// Default timeout for regular API requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
