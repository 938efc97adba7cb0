//! HTTP API handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};
use crate::reports::{AthleteStats, HistoryFilter, ReportSubmission, StoredReport};
use crate::service::ReportService;
use crate::status::{HealthStatus, TeamHealthSummary};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Report service over the configured store.
    pub service: ReportService,
    /// Prometheus render handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(service: ReportService) -> Self {
        Self {
            service,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.service)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether the store is reachable.
    pub ready: bool,
}

/// Response to a report submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Confirmation message.
    pub message: String,
    /// Derived status.
    pub status: HealthStatus,
    /// Derived recovery estimate, if an outage was declared.
    pub estimated_recovery_date: Option<DateTime<Utc>>,
}

/// Athlete status response.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Athlete id.
    pub user_id: String,
    /// Current status.
    pub health_status: HealthStatus,
    /// Restriction start.
    pub injury_date: Option<String>,
    /// Expected return.
    pub estimated_recovery_date: Option<String>,
}

/// Report history response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Reports, newest first.
    pub reports: Vec<StoredReport>,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 if the store answers, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.service.ping().await;
    let response = ReadyResponse { ready };

    if ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Submit a health report.
pub async fn submit_report(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ReportSubmission>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(submission) =
        payload.map_err(|rejection| ServiceError::MalformedInput(rejection.body_text()))?;
    let classification = state.service.submit_report(&submission).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            message: "Health report submitted successfully".to_string(),
            status: classification.status,
            estimated_recovery_date: classification.estimated_recovery_date,
        }),
    ))
}

/// Current status of an athlete.
pub async fn athlete_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<StatusResponse>> {
    let status = state.service.athlete_status(&user_id).await?;

    Ok(Json(StatusResponse {
        user_id,
        health_status: status.status,
        injury_date: status.injury_date,
        estimated_recovery_date: status.estimated_recovery_date,
    }))
}

/// Report count and streak of an athlete.
pub async fn athlete_stats(
    State(state): State<AppState>,
    Path(athlete_id): Path<String>,
) -> Result<Json<AthleteStats>> {
    Ok(Json(state.service.athlete_stats(&athlete_id).await?))
}

/// Stored reports of an athlete.
pub async fn report_history(
    State(state): State<AppState>,
    Path(athlete_id): Path<String>,
    params: std::result::Result<Query<HistoryFilter>, QueryRejection>,
) -> Result<Json<HistoryResponse>> {
    let Query(filter) =
        params.map_err(|rejection| ServiceError::MalformedInput(rejection.body_text()))?;
    let reports = state.service.report_history(&athlete_id, &filter).await?;
    Ok(Json(HistoryResponse { reports }))
}

/// Health summary of a team.
pub async fn team_health(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<TeamHealthSummary>> {
    Ok(Json(state.service.team_health(&team_id).await?))
}

/// Prometheus exposition.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::NOT_FOUND,
            "metrics recorder not installed".to_string(),
        ),
    }
}
