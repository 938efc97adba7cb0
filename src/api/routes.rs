//! HTTP API route definitions.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers::{
    athlete_stats, athlete_status, health, metrics, ready, report_history, submit_report,
    team_health, AppState,
};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics))
        // Reporting
        .route("/api/health/report", post(submit_report))
        .route("/api/health/status/:user_id", get(athlete_status))
        .route("/api/health/stats/:athlete_id", get(athlete_stats))
        .route("/api/health/reports/:athlete_id", get(report_history))
        .route("/api/teams/:team_id/health", get(team_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
