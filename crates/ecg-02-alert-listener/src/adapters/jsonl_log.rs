//! # JSONL Event Log
//!
//! Appends one JSON object per line to a local file opened in append mode.
//! Each line is flushed before `append` returns.

use crate::domain::LogEntry;
use crate::errors::ListenerError;
use crate::ports::outbound::EventLog;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// File-backed append-only event log.
#[derive(Debug)]
pub struct JsonlEventLog {
    path: PathBuf,
    file: Option<File>,
    lines_written: u64,
}

impl JsonlEventLog {
    /// Open (creating if needed) the log at `path` for appending.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ListenerError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        info!(path = %path.display(), "Event log opened");
        Ok(Self {
            path,
            file: Some(file),
            lines_written: 0,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines appended through this handle.
    #[must_use]
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }
}

#[async_trait]
impl EventLog for JsonlEventLog {
    async fn append(&mut self, entry: &LogEntry) -> Result<(), ListenerError> {
        let file = self.file.as_mut().ok_or(ListenerError::LogClosed)?;
        let mut line = entry.to_line()?;
        line.push('\n');
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        self.lines_written += 1;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ListenerError> {
        if let Some(file) = self.file.as_mut() {
            file.flush().await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ListenerError> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
            debug!(path = %self.path.display(), lines = self.lines_written, "Event log closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared_bus::ContractEvent;

    fn entry(name: &str, payload: &str) -> LogEntry {
        let event = ContractEvent::new("ecgcontract", name, payload.as_bytes().to_vec(), "tx");
        LogEntry::new(&event, None, Utc::now())
    }

    #[tokio::test]
    async fn test_append_writes_one_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");

        let mut log = JsonlEventLog::open(&path).await.unwrap();
        log.append(&entry("RecordStored", "{\"patientID\":\"p1\"}")).await.unwrap();
        log.append(&entry("AccessGranted", "{}")).await.unwrap();
        log.close().await.unwrap();

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["eventType"], "RECORD_STORED");
        assert_eq!(first["rawPayload"], "{\"patientID\":\"p1\"}");
    }

    #[tokio::test]
    async fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");

        for _ in 0..2 {
            let mut log = JsonlEventLog::open(&path).await.unwrap();
            log.append(&entry("DataAccessed", "{}")).await.unwrap();
            log.close().await.unwrap();
        }

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_append_after_close_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = JsonlEventLog::open(dir.path().join("events.log")).await.unwrap();
        log.close().await.unwrap();
        assert!(log.is_closed());
        assert!(matches!(
            log.append(&entry("DataAccessed", "{}")).await,
            Err(ListenerError::LogClosed)
        ));
        // Closing twice is fine.
        log.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("events.log");
        assert!(matches!(
            JsonlEventLog::open(&path).await,
            Err(ListenerError::LogIo(_))
        ));
    }
}
