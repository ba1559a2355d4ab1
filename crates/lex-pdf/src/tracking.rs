use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use crate::error::PdfError;
use crate::models::ExtractionResult;

/// Reads a JSONL results file and returns the `{legislation_type}/{identifier}`
/// keys already recorded, so a restarted run can skip them.
pub async fn load_completed(output_path: &Path) -> Result<HashSet<String>, PdfError> {
    let mut completed = HashSet::new();

    let file = match File::open(output_path).await {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(completed),
        Err(err) => return Err(PdfError::ObjectStore(err.to_string())),
    };

    let mut lines = BufReader::new(file).lines();
    while let Some(line) = lines.next_line().await.map_err(|err| PdfError::ObjectStore(err.to_string()))? {
        if line.trim().is_empty() {
            continue;
        }
        let Ok(result) = serde_json::from_str::<ExtractionResult>(&line) else {
            continue;
        };
        if let (Some(legislation_type), Some(identifier)) = (&result.legislation_type, &result.identifier) {
            completed.insert(format!("{legislation_type}/{identifier}"));
        }
    }

    info!(count = completed.len(), "loaded completed PDFs from output file");
    Ok(completed)
}

pub fn completed_key(legislation_type: &str, identifier: &str) -> String {
    format!("{legislation_type}/{identifier}")
}

/// Appends one extraction result as a single JSON line, flushing immediately
/// so a crash mid-batch still leaves a resumable file.
pub struct ResultSink {
    file: std::fs::File,
}

impl ResultSink {
    pub fn open(output_path: &Path) -> Result<Self, PdfError> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(output_path)
            .map_err(|err| PdfError::ObjectStore(err.to_string()))?;
        Ok(Self { file })
    }

    pub fn append(&mut self, result: &ExtractionResult) -> Result<(), PdfError> {
        let line = serde_json::to_string(result).map_err(|err| PdfError::MalformedResponse(err.to_string()))?;
        writeln!(self.file, "{line}").map_err(|err| PdfError::ObjectStore(err.to_string()))?;
        self.file.flush().map_err(|err| PdfError::ObjectStore(err.to_string()))?;
        Ok(())
    }
}

/// Async variant used when the sink is driven from inside a single async task.
pub struct AsyncResultSink {
    file: File,
}

impl AsyncResultSink {
    pub async fn open(output_path: &Path) -> Result<Self, PdfError> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(output_path)
            .await
            .map_err(|err| PdfError::ObjectStore(err.to_string()))?;
        Ok(Self { file })
    }

    pub async fn append(&mut self, result: &ExtractionResult) -> Result<(), PdfError> {
        let line = serde_json::to_string(result).map_err(|err| PdfError::MalformedResponse(err.to_string()))?;
        self.file
            .write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(|err| PdfError::ObjectStore(err.to_string()))?;
        self.file.flush().await.map_err(|err| PdfError::ObjectStore(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractionProvenance;
    use chrono::Utc;

    fn sample_result(legislation_type: &str, identifier: &str) -> ExtractionResult {
        ExtractionResult {
            extracted_data: "text".to_string(),
            provenance: ExtractionProvenance {
                source: "llm_ocr".to_string(),
                model: "test-model".to_string(),
                prompt_version: "v1".to_string(),
                timestamp: Utc::now(),
                processing_time_seconds: 1.0,
                input_tokens: 10,
                output_tokens: 20,
                cached_tokens: 0,
                response_id: "resp-1".to_string(),
            },
            success: true,
            error: None,
            pdf_source: "https://example.test/a.pdf".to_string(),
            legislation_type: Some(legislation_type.to_string()),
            identifier: Some(identifier.to_string()),
        }
    }

    #[tokio::test]
    async fn missing_file_yields_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.jsonl");
        let completed = load_completed(&path).await.unwrap();
        assert!(completed.is_empty());
    }

    #[tokio::test]
    async fn appended_results_are_resumable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");

        let mut sink = AsyncResultSink::open(&path).await.unwrap();
        sink.append(&sample_result("ukpga", "1985/12")).await.unwrap();
        sink.append(&sample_result("uksi", "1990/500")).await.unwrap();

        let completed = load_completed(&path).await.unwrap();
        assert!(completed.contains(&completed_key("ukpga", "1985/12")));
        assert!(completed.contains(&completed_key("uksi", "1990/500")));
        assert_eq!(completed.len(), 2);
    }
}
