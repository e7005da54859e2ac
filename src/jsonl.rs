//! JSON-lines files shared by the audit log and the status store.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub struct JsonlFile {
    path: PathBuf,
    // Serializes writers so lines never interleave.
    lock: Mutex<()>,
}

impl JsonlFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append<T, E>(&self, value: &T) -> Result<(), E>
    where
        T: Serialize,
        E: From<io::Error> + From<serde_json::Error>,
    {
        let mut line = serde_json::to_vec(value)?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    /// Every document in the file, in write order. A missing file reads as empty.
    pub async fn read_all<T, E>(&self) -> Result<Vec<T>, E>
    where
        T: DeserializeOwned,
        E: From<io::Error> + From<serde_json::Error>,
    {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(E::from))
            .collect()
    }
}
