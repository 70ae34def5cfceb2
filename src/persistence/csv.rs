//! Append-only CSV report of whale matches.

use std::path::PathBuf;

use tokio::{fs::OpenOptions, io::AsyncWriteExt};

use super::error::PersistenceError;

/// Appends rendered CSV lines to a report file, creating it on first use.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// Creates a sink for the given path. The file is opened lazily on the
    /// first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Appends pre-rendered lines to the report. A no-op for empty input.
    #[tracing::instrument(skip(self, lines), level = "debug")]
    pub async fn append(&self, lines: &str) -> Result<(), PersistenceError> {
        if lines.is_empty() {
            return Ok(());
        }

        let mut file =
            OpenOptions::new().create(true).append(true).open(&self.path).await?;
        file.write_all(lines.as_bytes()).await?;
        file.flush().await?;
        tracing::debug!(path = %self.path.display(), bytes = lines.len(), "Appended CSV lines.");
        Ok(())
    }
}
