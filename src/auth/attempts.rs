//! Failed-login bookkeeping per client address.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Failures allowed inside one window before logins are refused.
pub const MAX_FAILED_ATTEMPTS: u32 = 5;

pub const ATTEMPT_WINDOW: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptCheck {
    Allowed,
    Blocked,
}

#[derive(Debug, Clone, Copy)]
struct Attempt {
    count: u32,
    last: Instant,
}

/// Shared, process-local failure counter. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct LoginAttempts {
    inner: Arc<DashMap<String, Attempt>>,
}

impl LoginAttempts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `client` may try to log in at `now`.
    ///
    /// A counter whose last failure is older than the window starts over.
    pub fn check(&self, client: &str, now: Instant) -> AttemptCheck {
        let Some(mut entry) = self.inner.get_mut(client) else {
            return AttemptCheck::Allowed;
        };
        let since = now.saturating_duration_since(entry.last);
        if entry.count >= MAX_FAILED_ATTEMPTS && since < ATTEMPT_WINDOW {
            return AttemptCheck::Blocked;
        }
        if since > ATTEMPT_WINDOW {
            entry.count = 0;
        }
        AttemptCheck::Allowed
    }

    pub fn record_failure(&self, client: &str, now: Instant) {
        let mut entry = self
            .inner
            .entry(client.to_string())
            .or_insert(Attempt { count: 0, last: now });
        entry.count += 1;
        entry.last = now;
    }

    /// Forget `client` after a successful login.
    pub fn clear(&self, client: &str) {
        self.inner.remove(client);
    }

    pub fn failures(&self, client: &str) -> u32 {
        self.inner.get(client).map_or(0, |entry| entry.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_five_failures() {
        let attempts = LoginAttempts::new();
        let now = Instant::now();
        for _ in 0..4 {
            attempts.record_failure("10.0.0.1", now);
        }
        assert_eq!(attempts.check("10.0.0.1", now), AttemptCheck::Allowed);

        attempts.record_failure("10.0.0.1", now);
        assert_eq!(attempts.check("10.0.0.1", now), AttemptCheck::Blocked);
        assert_eq!(attempts.check("10.0.0.2", now), AttemptCheck::Allowed);
    }

    #[test]
    fn window_expiry_resets_the_counter() {
        let attempts = LoginAttempts::new();
        let start = Instant::now();
        for _ in 0..5 {
            attempts.record_failure("10.0.0.1", start);
        }

        let later = start + ATTEMPT_WINDOW + Duration::from_secs(1);
        assert_eq!(attempts.check("10.0.0.1", later), AttemptCheck::Allowed);
        assert_eq!(attempts.failures("10.0.0.1"), 0);
    }

    #[test]
    fn success_clears_the_counter() {
        let attempts = LoginAttempts::new();
        let now = Instant::now();
        attempts.record_failure("10.0.0.1", now);
        attempts.clear("10.0.0.1");
        assert_eq!(attempts.failures("10.0.0.1"), 0);
    }
}
