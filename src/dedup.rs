//! Flat-file record of article URLs that were already posted.
//!
//! The file is a pretty-printed JSON array of strings. It only ever grows.
//! Writes overwrite the file in place; concurrent runs are expected to be
//! serialized by whatever schedules the job.

use crate::error::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone)]
pub struct DedupStore {
    path: PathBuf,
}

impl DedupStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the posted URLs, or an empty list when the file does not exist yet.
    ///
    /// Malformed content is an error; it is never silently reset.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Vec<String>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No posted-URL file yet; starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        let urls: Vec<String> = serde_json::from_str(&raw)?;
        debug!(count = urls.len(), "Loaded posted URLs");
        Ok(urls)
    }

    /// Overwrite the file with the full list, two-space indented.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), count = urls.len()))]
    pub async fn save(&self, urls: &[String]) -> Result<()> {
        let json = serde_json::to_string_pretty(urls)?;
        fs::write(&self.path, json).await?;
        info!("Saved posted URLs");
        Ok(())
    }
}

/// Append `url` unless it is already recorded. Returns whether it was added.
pub fn record(urls: &mut Vec<String>, url: &str) -> bool {
    if urls.iter().any(|u| u == url) {
        return false;
    }
    urls.push(url.to_string());
    true
}
