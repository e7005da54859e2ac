//! Synthetic traffic-congestion estimates for a fixed set of Bangalore
//! junctions, served over a small HTTP API.

pub mod api;
pub mod audit;
pub mod config;
pub mod days;
pub mod error;
pub mod insight;
pub mod jsonl;
pub mod locations;
pub mod report;
pub mod severity;
pub mod signal;
pub mod status;

pub use api::{AppState, create_router};
pub use report::{HourlyEstimate, RangeQuery, RangeReport, ReportError, compute_range_report};
