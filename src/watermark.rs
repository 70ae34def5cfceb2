//! File-backed watermark of the last fully persisted block number.

use std::path::PathBuf;

use tokio::fs;

/// Reads and writes the single block number the next run resumes after.
///
/// The file holds one decimal number. A missing or unparseable file reads as
/// 0, which makes the first run start from the clamped range end.
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    /// Creates a store at the given path. Nothing is touched until the first
    /// read or write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the stored watermark, or 0 when the file is absent or holds
    /// no parseable number. The first parseable line wins.
    pub async fn read(&self) -> u64 {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No watermark file. Starting fresh.");
                return 0;
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Could not read watermark file. Starting from 0."
                );
                return 0;
            }
        };

        for line in contents.lines() {
            if let Ok(number) = line.trim().parse::<u64>() {
                return number;
            }
        }
        tracing::warn!(
            path = %self.path.display(),
            "Watermark file holds no parseable block number. Starting from 0."
        );
        0
    }

    /// Overwrites the watermark with the given block number.
    pub async fn write(&self, block_number: u64) -> Result<(), std::io::Error> {
        fs::write(&self.path, block_number.to_string()).await?;
        tracing::debug!(block_number, path = %self.path.display(), "Watermark updated.");
        Ok(())
    }
}
