/* demos/server.rs */

use axum::{
    Json, Router,
    routing::{get, post},
};
use fit_guard::LimiterConfig;
use fit_guard::RateLimiter;
use fit_guard::middleware::{cors_layer, rate_limit};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn accepted() -> Json<Value> {
    Json(json!({ "success": true }))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let allowed_origin =
        std::env::var("ALLOWED_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());
    let port = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080u16);

    let limiter = Arc::new(RateLimiter::new(LimiterConfig::fit_check_defaults()).await);

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/analyze-style", post(accepted))
        .route("/api/upload", post(accepted))
        .route("/api/generate-frens", post(accepted))
        .route("/api/top-contacts", get(accepted))
        .route("/api/frames", get(accepted).post(accepted))
        .layer(axum::middleware::from_fn_with_state(limiter, rate_limit))
        .layer(cors_layer(&allowed_origin));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, %allowed_origin, "server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
