//! Legacy file-based tracking: an optional, off-by-default secondary sink
//! alongside the vector store. Qdrant remains authoritative; these JSONL files exist only
//! so a deployment that still depends on the old append-only log keeps
//! working during migration.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::error::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessRecord {
    pub url: String,
    pub uuid: String,
    pub run_id: String,
    pub doc_type: String,
    pub year: i32,
    pub type_value: String,
    pub doc_date: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecord {
    pub url: String,
    pub error: String,
    pub run_id: String,
    pub doc_type: String,
    pub year: i32,
    pub type_value: String,
    pub timestamp: DateTime<Utc>,
}

/// Appends success/failure rows for one `(doc_type, year, type_value)`
/// combination to `<tracking_dir>/<doc_type>_<year>_<type_value>_{success,
/// failures}.jsonl`.
pub struct TrackingSink {
    success_path: PathBuf,
    failure_path: PathBuf,
}

impl TrackingSink {
    pub fn new(tracking_dir: &Path, doc_type: &str, year: i32, type_value: &str) -> Self {
        let stem = format!("{doc_type}_{year}_{type_value}");
        Self {
            success_path: tracking_dir.join(format!("{stem}_success.jsonl")),
            failure_path: tracking_dir.join(format!("{stem}_failures.jsonl")),
        }
    }

    pub async fn record_success(&self, record: &SuccessRecord) -> Result<(), PipelineError> {
        append_line(&self.success_path, record).await
    }

    pub async fn record_failure(&self, record: &FailureRecord) -> Result<(), PipelineError> {
        append_line(&self.failure_path, record).await
    }
}

async fn append_line<T: Serialize>(path: &Path, record: &T) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let line = serde_json::to_string(record).map_err(|err| PipelineError::Tracking(err.to_string()))?;
    let mut file = tokio::fs::OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(format!("{line}\n").as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Tracking(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_success_and_failure_rows_to_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = TrackingSink::new(dir.path(), "legislation", 2024, "ukpga");

        sink.record_success(&SuccessRecord {
            url: "http://x/1".to_string(),
            uuid: "11111111-1111-1111-1111-111111111111".to_string(),
            run_id: "run-1".to_string(),
            doc_type: "legislation".to_string(),
            year: 2024,
            type_value: "ukpga".to_string(),
            doc_date: None,
            timestamp: Utc::now(),
        })
        .await
        .unwrap();

        sink.record_failure(&FailureRecord {
            url: "http://x/2".to_string(),
            error: "parse error".to_string(),
            run_id: "run-1".to_string(),
            doc_type: "legislation".to_string(),
            year: 2024,
            type_value: "ukpga".to_string(),
            timestamp: Utc::now(),
        })
        .await
        .unwrap();

        let success_contents = tokio::fs::read_to_string(dir.path().join("legislation_2024_ukpga_success.jsonl")).await.unwrap();
        let failure_contents = tokio::fs::read_to_string(dir.path().join("legislation_2024_ukpga_failures.jsonl")).await.unwrap();
        assert_eq!(success_contents.lines().count(), 1);
        assert_eq!(failure_contents.lines().count(), 1);
    }
}
