//! End-to-end tests driving the router in-process.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use traffic_sentinel::audit::{AuditError, AuditRecord, AuditSink, MemoryAuditLog};
use traffic_sentinel::config::CorsOrigins;
use traffic_sentinel::signal::{JitterSource, SequenceJitter, ThreadRngJitter, round2};
use traffic_sentinel::status::StatusStore;
use traffic_sentinel::{AppState, create_router};

fn app_with(jitter: Arc<dyn JitterSource>) -> (Router, MemoryAuditLog) {
    let audit = MemoryAuditLog::new();
    let state = AppState::new(jitter, Arc::new(audit.clone()));
    (create_router(state, &CorsOrigins::Any), audit)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// =========================================================
// Reference data
// =========================================================

#[tokio::test]
async fn health_and_root() {
    let (app, _) = app_with(Arc::new(ThreadRngJitter));

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".into()));

    for uri in ["/api", "/api/"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["message"], "Bangalore Traffic Sentinel API");
        assert_eq!(body["version"], "1.0.0");
    }
}

#[tokio::test]
async fn locations_are_fixed_and_stable() {
    let (app, _) = app_with(Arc::new(ThreadRngJitter));

    let (status, first) = send(&app, get("/api/locations")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = send(&app, get("/api/locations")).await;
    assert_eq!(first, second);

    let ids: Vec<&str> = first.as_array().unwrap().iter().map(|l| l["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["silk_board", "kr_puram", "whitefield", "hebbal"]);
    assert_eq!(first[0]["name"], "Silk Board");
    assert_eq!(first[0]["latitude"], 12.9177);
    assert_eq!(first[0]["longitude"], 77.6233);
}

#[tokio::test]
async fn days_are_monday_first_and_stable() {
    let (app, _) = app_with(Arc::new(ThreadRngJitter));

    let (status, first) = send(&app, get("/api/days")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = send(&app, get("/api/days")).await;
    assert_eq!(first, second);
    assert_eq!(
        first["days"],
        json!(["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"])
    );
}

// =========================================================
// Predictions
// =========================================================

#[tokio::test]
async fn predicts_inclusive_range() {
    let (app, audit) = app_with(Arc::new(ThreadRngJitter));

    let (status, body) = send(
        &app,
        post_json(
            "/api/predict-traffic",
            json!({"place": "silk_board", "day": "Monday", "start_hour": 8, "end_hour": 11}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let predictions = body["predictions"].as_array().unwrap();
    let hours: Vec<u64> = predictions.iter().map(|p| p["hour"].as_u64().unwrap()).collect();
    assert_eq!(hours, vec![8, 9, 10, 11]);

    let peak_hour = body["peak_hour"].as_u64().unwrap();
    assert!(hours.contains(&peak_hour));

    let values: Vec<f64> = predictions.iter().map(|p| p["traffic_value"].as_f64().unwrap()).collect();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    assert_eq!(body["average_traffic"].as_f64().unwrap(), round2(mean));

    let max = values.iter().cloned().fold(f64::MIN, f64::max);
    assert_eq!(body["peak_traffic"].as_f64().unwrap(), max);

    assert_eq!(body["place"], "silk_board");
    assert_eq!(body["place_name"], "Silk Board");
    assert_eq!(body["day"], "Monday");
    assert_eq!(audit.len(), 1);
}

#[tokio::test]
async fn fixed_jitter_gives_exact_values() {
    let (app, audit) = app_with(Arc::new(SequenceJitter::constant(0.5)));

    let (status, body) = send(
        &app,
        post_json(
            "/api/predict-traffic",
            json!({"place": "Silk Board", "day": "Monday", "start_hour": 7, "end_hour": 9}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["place"], "silk_board");

    // 2500 * 1.1 = 2750, then * 1.8 for 8 and 9
    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions[0]["traffic_value"].as_f64().unwrap(), 2750.0);
    assert_eq!(predictions[0]["traffic_level"], "High");
    assert_eq!(predictions[0]["color"], "#EF4444");
    assert_eq!(predictions[0]["severity"], 3);
    assert_eq!(predictions[1]["traffic_value"].as_f64().unwrap(), 4950.0);
    assert_eq!(predictions[2]["traffic_value"].as_f64().unwrap(), 4950.0);

    // tie between 8 and 9 resolves to the earlier hour
    assert_eq!(body["peak_hour"], 8);
    assert_eq!(body["peak_traffic"].as_f64().unwrap(), 4950.0);
    assert_eq!(body["average_traffic"].as_f64().unwrap(), 4216.67);
    assert_eq!(
        body["insight"],
        "Peak congestion expected at 8:00. Consider alternative routes or delay travel by 1-2 hours."
    );

    let records = audit.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.place, "silk_board");
    assert_eq!(record.day, "Monday");
    assert_eq!((record.start_hour, record.end_hour), (7, 9));
    assert_eq!(record.peak_hour, 8);
    assert_eq!(record.peak_traffic, 4950.0);
}

#[tokio::test]
async fn half_cent_average_rounds_to_even() {
    let jitter = SequenceJitter::for_values(1800.0, &[1800.0, 1800.25]).unwrap();
    let (app, _) = app_with(Arc::new(jitter));

    let (status, body) = send(
        &app,
        post_json(
            "/api/predict-traffic",
            json!({"place": "whitefield", "day": "Tuesday", "start_hour": 6, "end_hour": 7}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictions"][0]["traffic_value"].as_f64().unwrap(), 1800.0);
    assert_eq!(body["predictions"][1]["traffic_value"].as_f64().unwrap(), 1800.25);
    assert_eq!(body["average_traffic"].as_f64().unwrap(), 1800.12);
}

#[tokio::test]
async fn moderate_peak_insight() {
    let (app, _) = app_with(Arc::new(SequenceJitter::constant(0.5)));

    // whitefield weekday off-peak is 1800, lunch is 2340
    let (status, body) = send(
        &app,
        post_json(
            "/api/predict-traffic",
            json!({"place": "whitefield", "day": "Wednesday", "start_hour": 11, "end_hour": 13}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["peak_hour"], 12);
    assert_eq!(body["predictions"][0]["traffic_level"], "Moderate");
    assert_eq!(
        body["insight"],
        "Moderate traffic expected. 12:00 shows highest activity. Plan buffer time."
    );
}

#[tokio::test]
async fn rejects_unknown_location_without_audit() {
    let (app, audit) = app_with(Arc::new(ThreadRngJitter));

    let (status, body) = send(
        &app,
        post_json(
            "/api/predict-traffic",
            json!({"place": "invalid_location", "day": "Monday", "start_hour": 8, "end_hour": 11}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_LOCATION");
    assert!(body["message"].as_str().unwrap().contains("silk_board"));
    assert!(audit.is_empty());
}

#[tokio::test]
async fn rejects_unknown_day_without_audit() {
    let (app, audit) = app_with(Arc::new(ThreadRngJitter));

    let (status, body) = send(
        &app,
        post_json(
            "/api/predict-traffic",
            json!({"place": "hebbal", "day": "Someday", "start_hour": 8, "end_hour": 11}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_DAY");
    assert!(body["message"].as_str().unwrap().contains("Monday"));
    assert!(audit.is_empty());
}

#[tokio::test]
async fn rejects_inverted_range_without_audit() {
    let (app, audit) = app_with(Arc::new(ThreadRngJitter));

    let (status, body) = send(
        &app,
        post_json(
            "/api/predict-traffic",
            json!({"place": "silk_board", "day": "Monday", "start_hour": 15, "end_hour": 10}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_RANGE");
    assert!(audit.is_empty());
}

#[tokio::test]
async fn rejects_out_of_bounds_hour() {
    let (app, audit) = app_with(Arc::new(ThreadRngJitter));

    let (status, body) = send(
        &app,
        post_json(
            "/api/predict-traffic",
            json!({"place": "silk_board", "day": "Monday", "start_hour": 8, "end_hour": 24}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_HOUR");
    assert_eq!(body["details"], "end_hour");
    assert!(audit.is_empty());
}

#[tokio::test]
async fn hour_bounds_win_over_unknown_location() {
    let (app, audit) = app_with(Arc::new(ThreadRngJitter));

    let (status, body) = send(
        &app,
        post_json(
            "/api/predict-traffic",
            json!({"place": "nowhere", "day": "Monday", "start_hour": 8, "end_hour": 30}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_HOUR");
    assert!(audit.is_empty());
}

struct FailingSink;

#[async_trait]
impl AuditSink for FailingSink {
    async fn append(&self, _record: AuditRecord) -> Result<(), AuditError> {
        Err(AuditError::Io(std::io::Error::other("store offline")))
    }
}

#[tokio::test]
async fn audit_failure_does_not_fail_prediction() {
    let state = AppState::new(Arc::new(ThreadRngJitter), Arc::new(FailingSink));
    let app = create_router(state, &CorsOrigins::Any);

    let (status, body) = send(
        &app,
        post_json(
            "/api/predict-traffic",
            json!({"place": "kr_puram", "day": "Saturday", "start_hour": 0, "end_hour": 23}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictions"].as_array().unwrap().len(), 24);

    // next request is unaffected
    let (status, _) = send(
        &app,
        post_json(
            "/api/predict-traffic",
            json!({"place": "kr_puram", "day": "Sunday", "start_hour": 5, "end_hour": 6}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// =========================================================
// Status checks
// =========================================================

#[tokio::test]
async fn status_checks_round_trip() {
    let (app, _) = app_with(Arc::new(ThreadRngJitter));

    let (status, created) = send(&app, post_json("/api/status", json!({"client_name": "dashboard"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["client_name"], "dashboard");
    assert!(created["id"].as_str().is_some_and(|id| id.len() == 36));
    assert!(created["timestamp"].as_str().is_some());

    send(&app, post_json("/api/status", json!({"client_name": "mobile"}))).await;

    let (status, listed) = send(&app, get("/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = listed.as_array().unwrap().iter().map(|c| c["client_name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["dashboard", "mobile"]);
    assert_eq!(listed[0]["id"], created["id"]);
}

#[tokio::test]
async fn status_create_requires_client_name() {
    let (app, _) = app_with(Arc::new(ThreadRngJitter));
    let (status, _) = send(&app, post_json("/api/status", json!({}))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn status_checks_persist_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status.jsonl");

    let store = StatusStore::open(&path).await.unwrap();
    let state = AppState::new(Arc::new(ThreadRngJitter), Arc::new(MemoryAuditLog::new())).with_status_store(store);
    let app = create_router(state, &CorsOrigins::Any);
    let (status, created) = send(&app, post_json("/api/status", json!({"client_name": "dashboard"}))).await;
    assert_eq!(status, StatusCode::OK);

    let store = StatusStore::open(&path).await.unwrap();
    let state = AppState::new(Arc::new(ThreadRngJitter), Arc::new(MemoryAuditLog::new())).with_status_store(store);
    let app = create_router(state, &CorsOrigins::Any);
    let (_, listed) = send(&app, get("/api/status")).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], created["id"]);
}

#[tokio::test]
async fn status_write_failure_is_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = StatusStore::open(dir.path().join("missing").join("status.jsonl")).await.unwrap();
    let state = AppState::new(Arc::new(ThreadRngJitter), Arc::new(MemoryAuditLog::new())).with_status_store(store);
    let app = create_router(state, &CorsOrigins::Any);

    let (status, body) = send(&app, post_json("/api/status", json!({"client_name": "dashboard"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "STATUS_STORE_ERROR");

    let (_, listed) = send(&app, get("/api/status")).await;
    assert_eq!(listed, json!([]));
}
