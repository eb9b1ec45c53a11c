/// Retry policy with exponential backoff
use std::future::Future;
use std::time::Duration;

use tracing::warn;

use hushy_shared::constants::{LINK_PREVIEW_MAX_RETRIES, LINK_PREVIEW_RETRY_BASE_MS};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for a single delay
    pub max_backoff: Duration,
    /// Growth factor between two delays
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: LINK_PREVIEW_MAX_RETRIES,
            initial_backoff: Duration::from_millis(LINK_PREVIEW_RETRY_BASE_MS),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

/// Run `f` until it succeeds, `should_retry` rejects the error, or the
/// retries run out. The last error is returned.
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    should_retry: impl Fn(&E) -> bool,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    let mut backoff = config.initial_backoff;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt >= config.max_retries || !should_retry(&e) {
                    return Err(e);
                }
                attempt += 1;

                warn!(
                    attempt,
                    max_retries = config.max_retries,
                    delay_ms = backoff.as_millis() as u64,
                    error = %e,
                    "retrying"
                );

                tokio::time::sleep(backoff).await;

                backoff = Duration::from_millis(
                    ((backoff.as_millis() as f64 * config.backoff_multiplier)
                        .min(config.max_backoff.as_millis() as f64)) as u64,
                );
            }
        }
    }
}
