/* src/types.rs */

use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Duration {
    Seconds(u64),
    Minutes(u64),
    Hours(u64),
}

impl Duration {
    pub fn seconds(n: u64) -> Self {
        Duration::Seconds(n)
    }
    pub fn minutes(n: u64) -> Self {
        Duration::Minutes(n)
    }
    pub fn hours(n: u64) -> Self {
        Duration::Hours(n)
    }

    pub fn as_seconds(&self) -> u64 {
        match self {
            Duration::Seconds(n) => *n,
            Duration::Minutes(n) => n * 60,
            Duration::Hours(n) => n * 3600,
        }
    }

    pub fn as_millis(&self) -> u64 {
        self.as_seconds().saturating_mul(1000)
    }
}

/// A request budget: at most `limit` admissions per `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleConfig {
    pub interval: Duration,
    pub limit: u32,
}

impl RuleConfig {
    pub fn new(interval: Duration, limit: u32) -> Self {
        Self { interval, limit }
    }

    /// Shorthand for the `(limit, windowSeconds)` pair used by the HTTP handlers.
    pub fn per_seconds(limit: u32, window_seconds: u64) -> Self {
        Self::new(Duration::seconds(window_seconds), limit)
    }
}

/// Counter state for one `route:client` key within its current window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    /// Epoch milliseconds at which this window ends.
    pub reset_at: u64,
}

impl RateLimitEntry {
    pub fn open(now: u64, interval: Duration) -> Self {
        Self {
            count: 0,
            reset_at: now.saturating_add(interval.as_millis()),
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now > self.reset_at
    }
}

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub admitted: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Epoch milliseconds at which the budget refills.
    pub reset_at: u64,
}

impl Decision {
    /// Reset time rounded up to whole epoch seconds, as sent in `X-RateLimit-Reset`.
    pub fn reset_at_secs(&self) -> u64 {
        self.reset_at.div_ceil(1000)
    }

    /// Whole seconds a rejected client should wait, never less than one.
    pub fn retry_after_secs(&self, now: u64) -> u64 {
        self.reset_at.saturating_sub(now).div_ceil(1000).max(1)
    }
}

pub fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_is_rounded_up_to_seconds() {
        let decision = Decision {
            admitted: true,
            limit: 5,
            remaining: 4,
            reset_at: 1_700_000_000_001,
        };
        assert_eq!(decision.reset_at_secs(), 1_700_000_001);
        assert_eq!(decision.retry_after_secs(1_700_000_000_001), 1);
        assert_eq!(decision.retry_after_secs(1_699_999_990_000), 11);
    }

    #[test]
    fn entry_expires_strictly_after_reset() {
        let entry = RateLimitEntry::open(1_000, Duration::seconds(60));
        assert_eq!(entry.reset_at, 61_000);
        assert!(!entry.is_expired(61_000));
        assert!(entry.is_expired(61_001));
    }
}
