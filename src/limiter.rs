/* src/limiter.rs */

use crate::config::LimiterConfig;
use crate::gc::{GarbageCollector, Records, sweep_expired};
use crate::types::{Decision, RateLimitEntry, RuleConfig, current_millis};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Fixed-window admission limiter keyed by `route:client`.
///
/// State lives in this process only; separate instances never share counts.
pub struct RateLimiter {
    config: LimiterConfig,
    records: Arc<Records>,
}

impl RateLimiter {
    /// Creates the limiter and spawns its background sweep on the current runtime.
    pub async fn new(config: LimiterConfig) -> Self {
        let records = Arc::new(RwLock::new(HashMap::new()));

        let gc = GarbageCollector::new(Arc::downgrade(&records), config.gc_interval);
        tokio::spawn(async move {
            gc.start().await;
        });

        Self { config, records }
    }

    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    pub async fn check(&self, route: &str, client: &str, rule: &RuleConfig) -> Decision {
        self.check_at(route, client, rule, current_millis()).await
    }

    /// Resolves the rule for `method route` from the config, then checks it.
    pub async fn check_route(&self, method: &str, route: &str, client: &str) -> Decision {
        let rule = *self.config.get_rule_for(method, route);
        self.check(route, client, &rule).await
    }

    /// Same as [`check`](Self::check) with an explicit clock reading in epoch millis.
    pub async fn check_at(&self, route: &str, client: &str, rule: &RuleConfig, now: u64) -> Decision {
        let key = format!("{}:{}", route, client);
        let mut records = self.records.write().await;

        let entry = records
            .entry(key)
            .or_insert_with(|| RateLimitEntry::open(now, rule.interval));
        if entry.is_expired(now) {
            *entry = RateLimitEntry::open(now, rule.interval);
        }
        entry.count = entry.count.saturating_add(1);

        let decision = Decision {
            admitted: entry.count <= rule.limit,
            limit: rule.limit,
            remaining: rule.limit.saturating_sub(entry.count),
            reset_at: entry.reset_at,
        };

        if !decision.admitted {
            tracing::debug!(route, client, count = entry.count, limit = rule.limit, "request rejected");
        }
        decision
    }

    /// Runs one sweep pass immediately, as the background task would at `now`.
    pub async fn sweep_at(&self, now: u64) -> usize {
        let mut records = self.records.write().await;
        sweep_expired(&mut records, now)
    }

    /// Number of tracked `route:client` entries, expired or not.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
