//! Route definitions and middleware layering.

use std::sync::Arc;

use axum::middleware as axum_middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{combine, download, health};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Build the application router.
///
/// Rate limiting applies only to the combine and download routes; probes
/// and metrics stay unthrottled so orchestration never gets a 429.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .route("/combine-videos", post(combine::combine_videos))
        .route("/combine-videos-async", post(combine::combine_videos_async))
        .route("/download/:job_id", get(download::download_video))
        .layer(axum_middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let mut router = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/healthz", get(health::health))
        .route("/ready", get(health::ready))
        .merge(api_routes);

    if let Some(handle) = metrics_handle {
        router = router.route(
            "/metrics",
            get(move || std::future::ready(handle.render())),
        );
    }

    router
        .layer(axum_middleware::from_fn(metrics_middleware))
        .layer(axum_middleware::from_fn(request_logging))
        .layer(axum_middleware::from_fn(request_id))
        .layer(axum_middleware::from_fn(security_headers))
        .layer(cors_layer(&state.config.cors_origins))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .with_state(state)
}
