//! Append-only audit trail of prediction requests.
//!
//! The handler writes one [`AuditRecord`] per successful prediction. Writes are
//! best effort: a failed append is logged by the caller and never changes the
//! response.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::jsonl::JsonlFile;
use crate::report::RangeReport;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit log I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("audit record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub place: String,
    pub day: String,
    pub start_hour: u8,
    pub end_hour: u8,
    pub peak_hour: u8,
    pub peak_traffic: f64,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn from_report(report: &RangeReport) -> Self {
        Self {
            id: Uuid::new_v4(),
            place: report.query.location.id.to_string(),
            day: report.query.day.to_string(),
            start_hour: report.query.start_hour,
            end_hour: report.query.end_hour,
            peak_hour: report.peak.hour,
            peak_traffic: report.peak.value,
            timestamp: Utc::now(),
        }
    }
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError>;
}

/// In-process audit log.
#[derive(Clone, Default)]
pub struct MemoryAuditLog {
    records: Arc<RwLock<Vec<AuditRecord>>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditLog {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.records.write().push(record);
        Ok(())
    }
}

/// One JSON document per line, appended to a file.
pub struct JsonlAuditLog {
    file: JsonlFile,
}

impl JsonlAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { file: JsonlFile::new(path) }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[async_trait]
impl AuditSink for JsonlAuditLog {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.file.append(&record).await
    }
}
