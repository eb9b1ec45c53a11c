use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use hushy_shared::constants::NOTIFICATION_DEDUP_WINDOW_SECS;

/// Remembers recently processed notification keys so a push delivered or
/// tapped twice is only handled once. Each key is forgotten `window` after
/// it was first seen.
#[derive(Debug)]
pub struct NotificationDeduper {
    window: Duration,
    seen: HashMap<String, Instant>,
}

impl NotificationDeduper {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: HashMap::new(),
        }
    }

    /// `true` the first time `key` is seen within the window.
    pub fn check_and_mark(&mut self, key: &str) -> bool {
        let now = Instant::now();
        let window = self.window;
        self.seen.retain(|_, seen_at| now.duration_since(*seen_at) < window);

        if self.seen.contains_key(key) {
            return false;
        }
        self.seen.insert(key.to_string(), now);
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl Default for NotificationDeduper {
    fn default() -> Self {
        Self::new(Duration::from_secs(NOTIFICATION_DEDUP_WINDOW_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn duplicate_within_window_is_ignored() {
        let mut dedup = NotificationDeduper::default();
        assert!(dedup.check_and_mark("n1"));

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(!dedup.check_and_mark("n1"));
    }

    #[tokio::test(start_paused = true)]
    async fn processable_again_after_window() {
        let mut dedup = NotificationDeduper::default();
        assert!(dedup.check_and_mark("n1"));

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(dedup.check_and_mark("n1"));
    }

    #[tokio::test(start_paused = true)]
    async fn window_counts_from_first_sighting() {
        let mut dedup = NotificationDeduper::default();
        assert!(dedup.check_and_mark("n1"));
        tokio::time::advance(Duration::from_secs(20)).await;
        assert!(!dedup.check_and_mark("n1"));
        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(dedup.check_and_mark("n1"));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_keys_are_evicted() {
        let mut dedup = NotificationDeduper::default();
        dedup.check_and_mark("a");
        dedup.check_and_mark("b");
        assert_eq!(dedup.len(), 2);

        tokio::time::advance(Duration::from_secs(31)).await;
        dedup.check_and_mark("c");
        assert_eq!(dedup.len(), 1);
    }
}
