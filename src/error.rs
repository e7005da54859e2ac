//! HTTP error mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::report::ReportError;
use crate::status::StatusError;

/// Error body returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Stable code for programmatic handling
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into(), details: None }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, error) = match &self {
            ReportError::InvalidLocation { given } => (
                StatusCode::BAD_REQUEST,
                ApiError::new("INVALID_LOCATION", message).with_details(format!("place: {given}")),
            ),
            ReportError::InvalidDay { given } => (
                StatusCode::BAD_REQUEST,
                ApiError::new("INVALID_DAY", message).with_details(format!("day: {given}")),
            ),
            // Field-level bounds, reported like a schema violation.
            ReportError::InvalidHour { field, .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("INVALID_HOUR", message).with_details(*field),
            ),
            ReportError::InvalidRange { .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::new("INVALID_RANGE", message),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl IntoResponse for StatusError {
    fn into_response(self) -> Response {
        error!(error = %self, "status store write failed");
        let body = ApiError::new("STATUS_STORE_ERROR", "Status check could not be stored")
            .with_details(self.to_string());
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
