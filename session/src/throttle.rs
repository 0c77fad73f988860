// Collapses repeated refresh triggers for the same session while a prior
// attempt may still be settling on the backend.
use moka::sync::Cache;
use std::time::Duration;

const SIZE: u64 = 64;

pub struct RefreshThrottle {
    cache: Cache<String, ()>,
}

impl RefreshThrottle {
    pub fn new(window: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(SIZE)
            .time_to_live(window)
            .build();

        RefreshThrottle { cache }
    }

    pub fn mark(&self, session: &str) {
        self.cache.insert(session.to_string(), ());
    }

    pub fn recently_triggered(&self, session: &str) -> bool {
        self.cache.contains_key(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marked_session_is_throttled() {
        let throttle = RefreshThrottle::new(Duration::from_secs(30));

        assert!(!throttle.recently_triggered("sess-1"));
        throttle.mark("sess-1");
        assert!(throttle.recently_triggered("sess-1"));
        assert!(!throttle.recently_triggered("sess-2"));
    }

    #[test]
    fn mark_expires_after_window() {
        let throttle = RefreshThrottle::new(Duration::from_millis(50));

        throttle.mark("sess-1");
        assert!(throttle.recently_triggered("sess-1"));

        std::thread::sleep(Duration::from_millis(80));
        assert!(!throttle.recently_triggered("sess-1"));
    }
}
