/* src/config.rs */

use crate::types::{Duration, RuleConfig};
use std::collections::HashMap;

/// Configuration for the rate limiter
#[derive(Debug, Clone)]
pub struct LimiterConfig {
    pub default_rule: RuleConfig,
    pub route_rules: HashMap<String, RuleConfig>,
    /// Keyed by `(METHOD, route)`; consulted before `route_rules`.
    pub method_rules: HashMap<(String, String), RuleConfig>,
    pub gc_interval: u64,
}

impl LimiterConfig {
    pub fn new(default_rule: RuleConfig) -> Self {
        Self {
            default_rule,
            route_rules: HashMap::new(),
            method_rules: HashMap::new(),
            gc_interval: 60, // sweep once a minute
        }
    }

    /// The budgets the Fit Check Studio API ships with.
    pub fn fit_check_defaults() -> Self {
        let per_minute = |limit| RuleConfig::new(Duration::minutes(1), limit);

        Self::new(per_minute(10))
            .add_route_rule("/api/analyze-style", per_minute(5))
            .add_route_rule("/api/upload", per_minute(10))
            .add_route_rule("/api/generate-frens", per_minute(5))
            .add_route_rule("/api/top-contacts", per_minute(15))
            .add_route_rule("/api/frames", per_minute(30))
            .add_method_rule("POST", "/api/frames", per_minute(3))
    }

    pub fn add_route_rule(mut self, route: &str, rule: RuleConfig) -> Self {
        self.route_rules.insert(route.to_string(), rule);
        self
    }

    pub fn add_method_rule(mut self, method: &str, route: &str, rule: RuleConfig) -> Self {
        self.method_rules
            .insert((method.to_ascii_uppercase(), route.to_string()), rule);
        self
    }

    pub fn with_gc_interval(mut self, gc_interval: u64) -> Self {
        self.gc_interval = gc_interval.max(1);
        self
    }

    pub fn get_rule_for_route(&self, route: &str) -> &RuleConfig {
        self.route_rules.get(route).unwrap_or(&self.default_rule)
    }

    pub fn get_rule_for(&self, method: &str, route: &str) -> &RuleConfig {
        self.method_rules
            .get(&(method.to_ascii_uppercase(), route.to_string()))
            .unwrap_or_else(|| self.get_rule_for_route(route))
    }

    pub fn has_route_rule(&self, route: &str) -> bool {
        self.route_rules.contains_key(route)
            || self.method_rules.keys().any(|(_, r)| r == route)
    }
}
