//! Client status checks.
//!
//! Records are always served from memory. A store opened on a file also
//! appends every new record to it and reloads them on the next start.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::jsonl::JsonlFile;

/// Maximum number of records returned by a listing.
pub const LIST_LIMIT: usize = 1000;

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("status store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("status record could not be encoded or decoded: {0}")]
    Codec(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCheck {
    pub id: Uuid,
    pub client_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct StatusStore {
    checks: Arc<RwLock<Vec<StatusCheck>>>,
    file: Option<Arc<JsonlFile>>,
}

impl StatusStore {
    /// Memory only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads any records already in `path` and persists new ones there.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StatusError> {
        let file = JsonlFile::new(path);
        let checks = file.read_all::<StatusCheck, StatusError>().await?;
        info!(path = %file.path().display(), loaded = checks.len(), "opened status store");
        Ok(Self {
            checks: Arc::new(RwLock::new(checks)),
            file: Some(Arc::new(file)),
        })
    }

    pub async fn create(&self, client_name: impl Into<String>) -> Result<StatusCheck, StatusError> {
        let check = StatusCheck {
            id: Uuid::new_v4(),
            client_name: client_name.into(),
            timestamp: Utc::now(),
        };
        // Persist first so a failed write never shows up in listings.
        if let Some(file) = &self.file {
            file.append::<_, StatusError>(&check).await?;
        }
        self.checks.write().push(check.clone());
        Ok(check)
    }

    /// Oldest first.
    pub fn list(&self, limit: usize) -> Vec<StatusCheck> {
        self.checks.read().iter().take(limit).cloned().collect()
    }
}
