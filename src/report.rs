//! Range orchestration: validates a query, samples one reading per hour and
//! reduces the readings to peak, average and insight.

use itertools::Itertools;
use thiserror::Error;
use tracing::debug;

use crate::days::Day;
use crate::insight::build_insight;
use crate::locations::{self, Location};
use crate::severity::{classify, SeverityTier};
use crate::signal::{self, JitterSource};

pub const MAX_HOUR: u8 = 23;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    #[error("Invalid location '{given}'. Supported locations: {}", locations::ids().join(", "))]
    InvalidLocation { given: String },

    #[error("Invalid day '{given}'. Supported days: {}", Day::names().join(", "))]
    InvalidDay { given: String },

    #[error("{field} must be between 0 and 23, got {value}")]
    InvalidHour { field: &'static str, value: i64 },

    #[error("End hour must be greater than or equal to start hour ({end} < {start})")]
    InvalidRange { start: u8, end: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyEstimate {
    pub hour: u8,
    pub value: f64,
    pub tier: SeverityTier,
}

impl HourlyEstimate {
    pub fn new(hour: u8, value: f64) -> Self {
        Self { hour, value, tier: classify(value) }
    }
}

/// A validated request: known location, known day, `start_hour <= end_hour`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeQuery {
    pub location: &'static Location,
    pub day: Day,
    pub start_hour: u8,
    pub end_hour: u8,
}

impl RangeQuery {
    /// Checks hour bounds, place, day and ordering, in that order.
    /// `place` is normalized before lookup.
    pub fn parse(place: &str, day: &str, start_hour: i64, end_hour: i64) -> Result<Self, ReportError> {
        let start_hour = hour_in_range("start_hour", start_hour)?;
        let end_hour = hour_in_range("end_hour", end_hour)?;
        let id = locations::normalize_id(place);
        let location = locations::find(&id)
            .ok_or_else(|| ReportError::InvalidLocation { given: place.to_string() })?;
        let day: Day = day
            .parse()
            .map_err(|_| ReportError::InvalidDay { given: day.to_string() })?;
        if end_hour < start_hour {
            return Err(ReportError::InvalidRange { start: start_hour, end: end_hour });
        }
        Ok(Self { location, day, start_hour, end_hour })
    }

    pub fn hours(&self) -> std::ops::RangeInclusive<u8> {
        self.start_hour..=self.end_hour
    }
}

fn hour_in_range(field: &'static str, value: i64) -> Result<u8, ReportError> {
    u8::try_from(value)
        .ok()
        .filter(|h| *h <= MAX_HOUR)
        .ok_or(ReportError::InvalidHour { field, value })
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeReport {
    pub query: RangeQuery,
    pub predictions: Vec<HourlyEstimate>,
    pub peak: HourlyEstimate,
    pub average: f64,
    pub insight: String,
}

pub fn compute_range_report(query: &RangeQuery, jitter: &dyn JitterSource) -> RangeReport {
    let predictions: Vec<HourlyEstimate> = query
        .hours()
        .map(|hour| {
            let value = signal::generate(query.location.id, query.day, hour, jitter);
            HourlyEstimate::new(hour, value)
        })
        .collect();

    // RangeQuery guarantees at least one hour. Strict comparison keeps the earliest peak.
    let peak = predictions
        .iter()
        .copied()
        .reduce(|best, next| if next.value > best.value { next } else { best })
        .unwrap_or_else(|| HourlyEstimate::new(query.start_hour, 0.0));

    let total: f64 = predictions.iter().map(|p| p.value).sum();
    let average = signal::round2(total / predictions.len().max(1) as f64);
    let insight = build_insight(&peak);

    debug!(
        location = query.location.id,
        day = %query.day,
        peak_hour = peak.hour,
        peak = peak.value,
        average,
        "range report computed"
    );

    RangeReport { query: *query, predictions, peak, average, insight }
}
