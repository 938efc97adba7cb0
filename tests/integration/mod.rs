//! Integration tests for the athlete health service.
//!
//! Most tests drive the full HTTP router over the in-memory store.
//! Tests marked `#[ignore]` talk to a real hosted database and need
//! SUPABASE_URL and SUPABASE_KEY.
//! Run with: cargo test --test integration -- --ignored

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{Duration, SecondsFormat, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use tower::ServiceExt;

use athlete_health::api::{create_router, AppState};
use athlete_health::config::{Config, StoreBackend};
use athlete_health::service::ReportService;
use athlete_health::status::HealthStatus;
use athlete_health::store::{Collection, MemoryStore, Operation, Query, RestStore, Store};
use athlete_health::ServiceError;

fn record(value: Value) -> serde_json::Map<String, Value> {
    value.as_object().cloned().expect("object literal")
}

/// Store with two athletes on team `t1` and one on `t2`.
fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    for (id, team) in [("a1", "t1"), ("a2", "t1"), ("a3", "t2")] {
        store.seed(
            Collection::Athletes,
            record(json!({
                "id": id,
                "team_id": team,
                "status": "Healthy",
                "injury_date": null,
                "estimated_recovery_date": null,
            })),
        );
    }
    store
}

fn app(store: &MemoryStore) -> Router {
    let service = ReportService::new(Arc::new(store.clone()));
    create_router(AppState::new(service))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response: Response = app.clone().oneshot(request).await.expect("router call");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_report(user_id: &str, answers: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/health/report")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"user_id": user_id, "answers_list": answers}).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn test_report_lifecycle() {
    let store = seeded_store();
    let app = app(&store);

    // Restrict a1 from training and competing
    let (status, body) = send(
        &app,
        post_report(
            "a1",
            json!({
                "injured": "Yes",
                "expected_outage": "14+ days",
                "missed_activity": "Training & Competing",
                "injury_location": "knee",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], json!("No training or competing"));

    let (status, body) = send(&app, get("/api/health/status/a1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["health_status"], json!("No training or competing"));
    assert!(body["injury_date"].is_string());
    assert!(body["estimated_recovery_date"].is_string());

    // Team view reflects the restriction
    let (status, body) = send(&app, get("/api/teams/t1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["num_athletes"], json!(2));
    assert_eq!(body["healthy_athletes"], json!(1));
    assert_eq!(body["red_athletes"], json!(1));
    assert_eq!(body["amber_athletes"], json!(0));
    assert_eq!(body["available_to_compete"], json!(1));
    assert_eq!(body["available_to_train"], json!(1));

    // A follow-up healthy report clears the dates
    let (status, body) = send(&app, post_report("a1", json!({"injured": "No"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], json!("Healthy"));

    let (_, body) = send(&app, get("/api/health/status/a1")).await;
    assert_eq!(body["health_status"], json!("Healthy"));
    assert_eq!(body["injury_date"], Value::Null);
    assert_eq!(body["estimated_recovery_date"], Value::Null);

    // Both reports were stored with their answers
    let (status, body) = send(&app, get("/api/health/reports/a1")).await;
    assert_eq!(status, StatusCode::OK);
    let reports = body["reports"].as_array().expect("reports array");
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().any(|r| r["injury_location"] == json!("knee")));

    // Two reports today break the streak
    let (status, body) = send(&app, get("/api/health/stats/a1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report_count"], json!(2));
    assert_eq!(body["consecutive_reports"], json!(0));
}

#[tokio::test]
async fn test_single_report_today_has_streak_of_one() {
    let store = seeded_store();
    let app = app(&store);

    let (status, _) = send(&app, post_report("a2", json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, get("/api/health/stats/a2")).await;
    assert_eq!(body["report_count"], json!(1));
    assert_eq!(body["consecutive_reports"], json!(1));
}

#[tokio::test]
async fn test_stats_for_athlete_without_reports() {
    let store = seeded_store();
    let app = app(&store);

    let (status, body) = send(&app, get("/api/health/stats/a3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"report_count": 0, "consecutive_reports": 0}));
}

#[tokio::test]
async fn test_history_since_and_limit() {
    let store = seeded_store();
    let now = Utc::now();
    for days_ago in [0i64, 3, 10] {
        let created = (now - Duration::days(days_ago)).to_rfc3339_opts(SecondsFormat::Micros, false);
        store.seed(
            Collection::Reports,
            record(json!({
                "id": format!("r{}", days_ago),
                "athlete_id": "a3",
                "created_at": created,
                "comments": format!("{} days ago", days_ago),
            })),
        );
    }
    let app = app(&store);

    let since = (now - Duration::days(5)).date_naive();
    let (status, body) = send(
        &app,
        get(&format!("/api/health/reports/a3?since={}", since)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["reports"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["r0", "r3"]);

    let (_, body) = send(&app, get("/api/health/reports/a3?limit=1")).await;
    assert_eq!(body["reports"].as_array().unwrap().len(), 1);
    assert_eq!(body["reports"][0]["id"], json!("r0"));

    let (status, _) = send(&app, get("/api/health/reports/a3?since=yesterday")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_report_changes_nothing() {
    let store = seeded_store();
    let app = app(&store);

    let (status, body) = send(
        &app,
        post_report(
            "a1",
            json!({"expected_outage": "a few days", "missed_activity": "Competing Only"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    assert!(store.records(Collection::Reports).is_empty());
    let (_, body) = send(&app, get("/api/health/status/a1")).await;
    assert_eq!(body["health_status"], json!("Healthy"));
}

#[tokio::test]
async fn test_failed_status_update_stores_no_report() {
    let store = seeded_store();
    store.fail(Operation::Update);
    let app = app(&store);

    let (status, _) = send(
        &app,
        post_report(
            "a1",
            json!({"expected_outage": "7 days", "missed_activity": "Competing Only"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(store.records(Collection::Reports).is_empty());
}

#[tokio::test]
async fn test_failed_report_insert_keeps_status() {
    let store = seeded_store();
    store.fail(Operation::Insert);
    let app = app(&store);

    let (status, _) = send(
        &app,
        post_report(
            "a2",
            json!({"expected_outage": "7 days", "missed_activity": "Competing Only"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    // Status update landed before the insert failed
    let (_, body) = send(&app, get("/api/health/status/a2")).await;
    assert_eq!(body["health_status"], json!("No competing"));
    assert!(store.records(Collection::Reports).is_empty());

    // Store recovers; next report goes through
    store.recover(Operation::Insert);
    let (status, _) = send(&app, post_report("a2", json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(store.records(Collection::Reports).len(), 1);
}

#[tokio::test]
async fn test_service_errors_without_router() {
    let store = seeded_store();
    let service = ReportService::new(Arc::new(store.clone()));

    assert_ok!(service.athlete_status("a1").await);
    let err = assert_err!(service.athlete_status("ghost").await);
    assert!(matches!(err, ServiceError::NotFound { .. }));

    store.fail(Operation::Fetch);
    let err = assert_err!(service.team_health("t1").await);
    assert!(err.is_persistence());
    assert!(!service.ping().await);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let store = seeded_store();
    let app = app(&store);

    let (status, _) = send(&app, get("/api/nothing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Get a REST store config from environment.
fn rest_config() -> Option<Config> {
    dotenvy::dotenv().ok();

    let supabase_url = std::env::var("SUPABASE_URL").ok()?;
    let supabase_key = std::env::var("SUPABASE_KEY").ok()?;
    if supabase_url.is_empty() || supabase_key.is_empty() {
        return None;
    }

    Some(Config {
        store_backend: StoreBackend::Rest,
        supabase_url: Some(supabase_url),
        supabase_key: Some(supabase_key),
        ..Config::default()
    })
}

/// Test that the hosted athletes table answers a bounded query.
#[tokio::test]
#[ignore = "requires SUPABASE_URL and SUPABASE_KEY"]
async fn test_rest_fetch_athletes() {
    let config = match rest_config() {
        Some(c) => c,
        None => {
            println!("Skipping: SUPABASE_URL or SUPABASE_KEY not set");
            return;
        }
    };

    let store = RestStore::from_config(&config).expect("store");
    let rows = store
        .fetch(Collection::Athletes, &Query::new().limit(5))
        .await
        .expect("fetch athletes");
    assert!(rows.len() <= 5);

    for row in rows {
        if let Some(status) = row.get("status").and_then(Value::as_str) {
            assert!(status.parse::<HealthStatus>().is_ok(), "unknown status {}", status);
        }
    }
}
