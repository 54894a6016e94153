/* src/middleware.rs */

use crate::client::{client_key, route_key};
use crate::limiter::RateLimiter;
use crate::types::{Decision, current_millis};
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

pub const TOO_MANY_REQUESTS_MESSAGE: &str = "Too many requests. Please try again later.";

/// Caller identity for a request, see [`client_key`].
pub fn client_key_from_headers(headers: &HeaderMap) -> String {
    let header_str = |name: &str| headers.get(name).and_then(|h| h.to_str().ok());
    client_key(header_str("x-forwarded-for"), header_str("x-real-ip"))
}

/// Admission middleware for `axum::middleware::from_fn_with_state`.
///
/// Every limited response carries the three `X-RateLimit-*` headers; rejected
/// requests short-circuit with `429` and a `Retry-After` hint.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() == Method::OPTIONS {
        return next.run(req).await;
    }

    let method = req.method().clone();
    let client = client_key_from_headers(req.headers());
    let route = route_key(req.uri().path());
    let decision = limiter.check_route(method.as_str(), &route, &client).await;

    let mut response = if decision.admitted {
        next.run(req).await
    } else {
        too_many_requests(&decision)
    };
    apply_rate_limit_headers(response.headers_mut(), &decision);
    response
}

pub fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &Decision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset_at_secs()));
}

pub fn too_many_requests(decision: &Decision) -> Response {
    let retry_after = decision.retry_after_secs(current_millis());
    (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, HeaderValue::from(retry_after))],
        Json(json!({ "error": TOO_MANY_REQUESTS_MESSAGE })),
    )
        .into_response()
}

/// CORS for the public API: the configured origin plus local dev servers.
pub fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let allowed = allowed_origin.to_string();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin
                    .to_str()
                    .map(|o| is_allowed_origin(o, &allowed))
                    .unwrap_or(false)
            },
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn is_allowed_origin(origin: &str, allowed_origin: &str) -> bool {
    origin == allowed_origin
        || origin.starts_with("http://localhost:")
        || origin.starts_with("http://127.0.0.1:")
}
