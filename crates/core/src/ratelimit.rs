use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-key sliding-window admission. Thread-safe; O(window size) per call,
/// which is small for the limits this core uses (5-10 entries).
///
/// Grounded in the teacher's `ConnectionManager` pattern of a single
/// internally-locked table keyed by an identity, with a `cleanup_*` sweep
/// (`crates/game/src/net/connection.rs::cleanup_timed_out`), adapted here to
/// prune whole keys instead of individual entries.
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Admits the call if fewer than `limit` timestamps were accepted for
    /// `key` within the last `window`. Accepted calls append `now`.
    pub fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap();
        let entry = windows.entry(key.to_string()).or_default();
        entry.retain(|&t| now.duration_since(t) < self.window);

        if entry.len() >= self.limit as usize {
            return false;
        }

        entry.push(now);
        true
    }

    /// Drops keys whose entire window has expired. Intended to be driven by
    /// an hourly background task so the map doesn't grow unbounded with
    /// one-shot callers.
    pub fn prune(&self) {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap();
        windows.retain(|_, entries| {
            entries.retain(|&t| now.duration_since(t) < self.window);
            !entries.is_empty()
        });
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let rl = RateLimiter::new(3, Duration::from_millis(200));
        assert!(rl.allow("neo"));
        assert!(rl.allow("neo"));
        assert!(rl.allow("neo"));
        assert!(!rl.allow("neo"));
    }

    #[test]
    fn window_restores_capacity() {
        let rl = RateLimiter::new(1, Duration::from_millis(50));
        assert!(rl.allow("neo"));
        assert!(!rl.allow("neo"));
        sleep(Duration::from_millis(70));
        assert!(rl.allow("neo"));
    }

    #[test]
    fn keys_are_independent() {
        let rl = RateLimiter::new(1, Duration::from_millis(200));
        assert!(rl.allow("neo"));
        assert!(rl.allow("trinity"));
    }

    #[test]
    fn prune_drops_fully_expired_keys() {
        let rl = RateLimiter::new(1, Duration::from_millis(20));
        rl.allow("neo");
        sleep(Duration::from_millis(40));
        rl.prune();
        assert_eq!(rl.tracked_keys(), 0);
    }
}
