use crate::api::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the admin API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::health_check))
        // Monitoring scheduler control
        .route("/api/monitoring/status", get(handlers::get_status))
        .route(
            "/api/monitoring/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route("/api/monitoring/restart", post(handlers::restart_all))
        .route("/api/monitoring/restart/:kind", post(handlers::restart_job))
        // Prometheus
        .route("/metrics", get(handlers::metrics))
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
