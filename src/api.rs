//! HTTP surface: routing, DTOs and handlers.

use axum::{
    Json, Router,
    extract::State,
    http::HeaderValue,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::audit::{AuditRecord, AuditSink};
use crate::config::CorsOrigins;
use crate::days::Day;
use crate::locations::{LOCATIONS, Location};
use crate::report::{HourlyEstimate, RangeQuery, RangeReport, ReportError, compute_range_report};
use crate::signal::JitterSource;
use crate::status::{LIST_LIMIT, StatusCheck, StatusError, StatusStore};

pub const API_NAME: &str = "Bangalore Traffic Sentinel API";
pub const API_VERSION: &str = "1.0.0";

// Shared across all handlers; every member is safe to use concurrently.
#[derive(Clone)]
pub struct AppState {
    pub jitter: Arc<dyn JitterSource>,
    pub audit: Arc<dyn AuditSink>,
    pub status: StatusStore,
}

impl AppState {
    pub fn new(jitter: Arc<dyn JitterSource>, audit: Arc<dyn AuditSink>) -> Self {
        Self { jitter, audit, status: StatusStore::new() }
    }

    pub fn with_status_store(mut self, status: StatusStore) -> Self {
        self.status = status;
        self
    }
}

pub fn create_router(state: AppState, origins: &CorsOrigins) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(allow_origin(origins));

    let api = Router::new()
        .route("/", get(root))
        .route("/locations", get(list_locations))
        .route("/days", get(list_days))
        .route("/predict-traffic", post(predict_traffic))
        .route("/status", post(create_status_check).get(list_status_checks));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        // The nested "/" only answers "/api".
        .route("/api/", get(root))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn allow_origin(origins: &CorsOrigins) -> AllowOrigin {
    match origins {
        CorsOrigins::Any => AllowOrigin::any(),
        CorsOrigins::List(list) => {
            let values: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(origin = %origin, "ignoring malformed CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(values)
        }
    }
}

// --- API DTOs ---

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DaysResponse {
    pub days: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PredictionRequest {
    pub place: String,
    pub day: String,
    pub start_hour: i64,
    pub end_hour: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HourlyPrediction {
    pub hour: u8,
    pub traffic_value: f64,
    pub traffic_level: String,
    pub color: String,
    pub severity: u8,
}

impl From<&HourlyEstimate> for HourlyPrediction {
    fn from(estimate: &HourlyEstimate) -> Self {
        Self {
            hour: estimate.hour,
            traffic_value: estimate.value,
            traffic_level: estimate.tier.label().to_string(),
            color: estimate.tier.color().to_string(),
            severity: estimate.tier.rank(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub place: String,
    pub place_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub day: String,
    pub predictions: Vec<HourlyPrediction>,
    pub peak_hour: u8,
    pub peak_traffic: f64,
    pub average_traffic: f64,
    pub insight: String,
}

impl From<&RangeReport> for PredictionResponse {
    fn from(report: &RangeReport) -> Self {
        let location = report.query.location;
        Self {
            place: location.id.to_string(),
            place_name: location.name.to_string(),
            latitude: location.latitude,
            longitude: location.longitude,
            day: report.query.day.to_string(),
            predictions: report.predictions.iter().map(HourlyPrediction::from).collect(),
            peak_hour: report.peak.hour,
            peak_traffic: report.peak.value,
            average_traffic: report.average,
            insight: report.insight.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusCheckCreate {
    pub client_name: String,
}

// --- Handlers ---

async fn root() -> Json<RootResponse> {
    Json(RootResponse { message: API_NAME.to_string(), version: API_VERSION.to_string() })
}

async fn list_locations() -> Json<&'static [Location]> {
    Json(LOCATIONS.as_slice())
}

async fn list_days() -> Json<DaysResponse> {
    Json(DaysResponse { days: Day::names().map(String::from).collect() })
}

async fn predict_traffic(
    State(state): State<AppState>,
    Json(payload): Json<PredictionRequest>,
) -> Result<Json<PredictionResponse>, ReportError> {
    let query = RangeQuery::parse(&payload.place, &payload.day, payload.start_hour, payload.end_hour)
        .inspect_err(|err| info!(error = %err, "rejected prediction request"))?;

    let report = compute_range_report(&query, state.jitter.as_ref());

    // The report is owed to the caller whether or not the audit write lands.
    if let Err(err) = state.audit.append(AuditRecord::from_report(&report)).await {
        warn!(error = %err, place = query.location.id, "failed to record prediction audit");
    }

    info!(
        place = query.location.id,
        day = %query.day,
        start_hour = query.start_hour,
        end_hour = query.end_hour,
        peak_hour = report.peak.hour,
        "served traffic prediction"
    );

    Ok(Json(PredictionResponse::from(&report)))
}

async fn create_status_check(
    State(state): State<AppState>,
    Json(payload): Json<StatusCheckCreate>,
) -> Result<Json<StatusCheck>, StatusError> {
    let check = state.status.create(payload.client_name).await?;
    info!(id = %check.id, client = %check.client_name, "status check recorded");
    Ok(Json(check))
}

async fn list_status_checks(State(state): State<AppState>) -> Json<Vec<StatusCheck>> {
    Json(state.status.list(LIST_LIMIT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditLog;
    use crate::signal::ThreadRngJitter;

    #[test]
    fn router_builds_with_origin_list() {
        let state = AppState::new(Arc::new(ThreadRngJitter), Arc::new(MemoryAuditLog::new()));
        let origins = CorsOrigins::List(vec!["http://localhost:3000".into(), "bad\norigin".into()]);
        let _router = create_router(state, &origins);
    }

    #[test]
    fn hourly_prediction_carries_tier_fields() {
        let dto = HourlyPrediction::from(&HourlyEstimate::new(18, 2500.0));
        assert_eq!(dto.traffic_level, "High");
        assert_eq!(dto.color, "#EF4444");
        assert_eq!(dto.severity, 3);
    }
}
