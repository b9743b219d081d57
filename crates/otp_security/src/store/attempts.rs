//! Consecutive failed-attempt tracking per user

use dashmap::DashMap;
use tracing::debug;

/// Counts consecutive OTP verification failures per user.
///
/// When a user reaches the threshold the counter restarts and the caller is
/// told to record a `multiple_attempts` event.
#[derive(Debug)]
pub struct AttemptTracker {
    failures: DashMap<String, u32>,
    threshold: u32,
}

impl AttemptTracker {
    /// Create a tracker with the given threshold
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            failures: DashMap::new(),
            threshold: threshold.max(1),
        }
    }

    /// Record a failure. Returns the attempt count when the threshold is reached.
    pub fn record_failure(&self, user_id: &str) -> Option<u32> {
        let mut entry = self.failures.entry(user_id.to_string()).or_insert(0);
        *entry += 1;
        let attempts = *entry;
        if attempts >= self.threshold {
            *entry = 0;
            debug!(user_id, attempts, "Failed attempt threshold reached");
            Some(attempts)
        } else {
            None
        }
    }

    /// Forget a user's failures after a successful verification
    pub fn record_success(&self, user_id: &str) {
        self.failures.remove(user_id);
    }

    /// Current consecutive failures for a user
    #[must_use]
    pub fn failures(&self, user_id: &str) -> u32 {
        self.failures.get(user_id).map_or(0, |entry| *entry)
    }

    /// Forget every user
    pub fn clear(&self) {
        self.failures.clear();
    }
}
