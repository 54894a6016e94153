/* src/lib.rs */

//! Request admission limiting and bounded local fit history for Fit Check Studio.
//!
//! The limiter is a per-process fixed-window counter keyed by `route:client`,
//! swept periodically by a background task. The history store keeps saved
//! fits in a key-value medium and evicts the oldest ones when it fills up.

use once_cell::sync::OnceCell;
use std::sync::Arc;

mod client;
mod config;
mod error;
mod gc;
pub mod history;
mod limiter;
#[cfg(feature = "axum")]
pub mod middleware;
mod types;

pub use client::*;
pub use config::*;
pub use error::{BackendError, HistoryError};
pub use limiter::RateLimiter;
pub use types::*;

// Global rate limiter instance, initialized once.
static GLOBAL_LIMITER: OnceCell<Arc<RateLimiter>> = OnceCell::new();

/// Initialize the global rate limiter with a default rule and optional route rules.
/// This must be called once, typically at application startup, before any calls to `limit!`.
///
/// # Panics
///
/// Panics if called more than once.
///
/// # Examples
///
/// ```rust,ignore
/// use fit_guard::*;
///
/// #[tokio::main]
/// async fn main() {
///     init_rate_limiter!(
///         default: RuleConfig::new(Duration::minutes(1), 10),
///         gc_interval: Some(60),
///         routes: [
///             ("/api/analyze-style", RuleConfig::new(Duration::minutes(1), 5)),
///             ("/api/top-contacts", RuleConfig::new(Duration::minutes(1), 15)),
///         ]
///     ).await;
/// }
/// ```
#[macro_export]
macro_rules! init_rate_limiter {
    (
        default: $default_rule:expr
        $(, gc_interval: $gc_interval:expr)?
        $(, routes: [ $(($route:expr, $rule:expr)),* $(,)? ])?
    ) => {
        {
            let mut config = $crate::LimiterConfig::new($default_rule);

            $(
                if let Some(secs) = $gc_interval {
                    config = config.with_gc_interval(secs);
                }
            )?

            $(
                $(
                    config = config.add_route_rule($route, $rule);
                )*
            )?

            $crate::initialize_limiter(config)
        }
    };
}

/// Check a request against the global limiter, yielding a [`Decision`].
///
/// With two arguments the route's configured rule applies; a third argument
/// supplies the rule explicitly.
///
/// # Panics
///
/// Panics if the rate limiter has not been initialized.
#[macro_export]
macro_rules! limit {
    ($route:expr, $client:expr) => {
        $crate::check_limit($route, $client)
    };
    ($route:expr, $client:expr, $rule:expr) => {
        $crate::check_limit_with($route, $client, $rule)
    };
}

/// Initialize the global rate limiter. Should be called only once.
pub async fn initialize_limiter(config: LimiterConfig) {
    let limiter = RateLimiter::new(config).await;
    if GLOBAL_LIMITER.set(Arc::new(limiter)).is_err() {
        panic!("Rate limiter has already been initialized.");
    }
}

/// The global limiter, if [`initialize_limiter`] has run.
pub fn global_limiter() -> Option<Arc<RateLimiter>> {
    GLOBAL_LIMITER.get().cloned()
}

/// Check a request using the rule configured for `route`.
pub async fn check_limit(route: &str, client: &str) -> Decision {
    let limiter = expect_global();
    let rule = *limiter.config().get_rule_for_route(route);
    limiter.check(route, client, &rule).await
}

/// Check a request against an explicit rule.
pub async fn check_limit_with(route: &str, client: &str, rule: RuleConfig) -> Decision {
    expect_global().check(route, client, &rule).await
}

fn expect_global() -> &'static RateLimiter {
    match GLOBAL_LIMITER.get() {
        Some(limiter) => limiter,
        None => panic!("Rate limiter not initialized! Call init_rate_limiter! first."),
    }
}
