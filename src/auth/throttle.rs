//! Login Throttle
//! Mission: Slow down credential brute-forcing with a sliding failure window

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct FailureEntry {
    count: u32,
    window_start: Instant,
}

/// In-memory failed-login counter per handle.
///
/// Successful logins clear the handle's entry. Once the failure count
/// reaches the limit, further attempts for that handle are refused until
/// the window rolls over.
pub struct LoginThrottle {
    max_failures: u32,
    window: Duration,
    state: Mutex<HashMap<String, FailureEntry>>,
}

impl LoginThrottle {
    pub fn new(max_failures: u32, window: Duration) -> Self {
        Self {
            max_failures,
            window,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Whether a login attempt for this handle may proceed.
    pub fn check(&self, handle: &str) -> bool {
        let mut state = self.state.lock();
        let Some(entry) = state.get_mut(handle) else {
            return true;
        };

        if entry.window_start.elapsed() >= self.window {
            state.remove(handle);
            return true;
        }

        entry.count < self.max_failures
    }

    pub fn record_failure(&self, handle: &str) {
        let mut state = self.state.lock();
        let now = Instant::now();

        let entry = state.entry(handle.to_string()).or_insert(FailureEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
    }

    pub fn clear(&self, handle: &str) {
        self.state.lock().remove(handle);
    }

    /// Drop stale entries (call from a background task).
    pub fn cleanup(&self) {
        let window = self.window;
        self.state
            .lock()
            .retain(|_, entry| entry.window_start.elapsed() < window * 2);
    }
}
