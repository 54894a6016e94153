/* src/gc.rs */

use crate::types::{RateLimitEntry, current_millis};
use std::collections::HashMap;
use std::sync::Weak;
use tokio::sync::RwLock;
use tokio::time::{Duration as TokioDuration, MissedTickBehavior, interval};

pub(crate) type Records = RwLock<HashMap<String, RateLimitEntry>>;

/// Periodically drops entries whose window has already ended.
///
/// Holds only a weak handle to the records so the task winds down once the
/// owning limiter is dropped.
pub struct GarbageCollector {
    records: Weak<Records>,
    gc_interval: u64,
}

impl GarbageCollector {
    pub(crate) fn new(records: Weak<Records>, gc_interval: u64) -> Self {
        Self {
            records,
            gc_interval,
        }
    }

    pub async fn start(self) {
        let mut interval_timer = interval(TokioDuration::from_secs(self.gc_interval));
        interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval_timer.tick().await;
            let Some(records) = self.records.upgrade() else {
                tracing::debug!("rate limiter dropped, stopping sweep");
                break;
            };
            let mut records = records.write().await;
            sweep_expired(&mut records, current_millis());
        }
    }
}

/// Removes every entry expired at `now`; returns how many were dropped.
pub(crate) fn sweep_expired(records: &mut HashMap<String, RateLimitEntry>, now: u64) -> usize {
    let before = records.len();
    records.retain(|_key, entry| !entry.is_expired(now));
    let removed = before - records.len();

    if removed > 0 {
        tracing::debug!(removed, remaining = records.len(), "swept expired rate limit entries");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Duration;
    use std::sync::Arc;

    #[test]
    fn sweep_keeps_live_windows() {
        let mut records = HashMap::new();
        records.insert("a:1".to_string(), RateLimitEntry::open(0, Duration::seconds(10)));
        records.insert("b:1".to_string(), RateLimitEntry::open(5_000, Duration::seconds(10)));
        records.insert("c:1".to_string(), RateLimitEntry::open(9_000, Duration::seconds(1)));

        // a ends at 10_000, b at 15_000, c at 10_000
        assert_eq!(sweep_expired(&mut records, 10_000), 0);
        assert_eq!(sweep_expired(&mut records, 10_001), 2);
        assert!(records.contains_key("b:1"));
        assert_eq!(sweep_expired(&mut records, 15_001), 1);
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn collector_stops_when_records_are_dropped() {
        let records: Arc<Records> = Arc::new(RwLock::new(HashMap::new()));
        let gc = GarbageCollector::new(Arc::downgrade(&records), 1);
        drop(records);

        tokio::time::timeout(TokioDuration::from_secs(2), gc.start())
            .await
            .expect("collector should exit once the limiter is gone");
    }
}
