//! Global request spacing for the link-preview endpoint.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

/// Lets at most one request start per `min_interval`. Callers queue on the
/// lock and are released in arrival order.
#[derive(Debug)]
pub struct RequestThrottle {
    min_interval: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl RequestThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_start: Mutex::new(None),
        }
    }

    /// Wait for this caller's turn.
    pub async fn acquire(&self) {
        let mut last = self.last_start.lock().await;

        if let Some(prev) = *last {
            let ready_at = prev + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                trace!(wait_ms = (ready_at - now).as_millis() as u64, "throttling request");
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
    }
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::new(Duration::from_millis(
            hushy_shared::constants::LINK_PREVIEW_MIN_INTERVAL_MS,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn first_request_is_immediate() {
        let throttle = RequestThrottle::new(Duration::from_secs(1));
        let start = Instant::now();
        throttle.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn spaces_consecutive_requests() {
        let throttle = RequestThrottle::new(Duration::from_secs(1));
        let start = Instant::now();
        for _ in 0..3 {
            throttle.acquire().await;
        }
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_are_serialised() {
        let throttle = Arc::new(RequestThrottle::new(Duration::from_secs(1)));
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let throttle = throttle.clone();
                tokio::spawn(async move {
                    throttle.acquire().await;
                    Instant::now()
                })
            })
            .collect();

        let mut times = Vec::new();
        for h in handles {
            times.push(h.await.unwrap());
        }
        times.sort();

        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(1));
        }
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_gap_resets_wait() {
        let throttle = RequestThrottle::new(Duration::from_secs(1));
        throttle.acquire().await;
        tokio::time::advance(Duration::from_secs(5)).await;

        let start = Instant::now();
        throttle.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
