use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::models::{ExtractionProvenance, ExtractionResult};

const PER_DOCUMENT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

#[derive(Debug, Clone)]
pub struct OcrClientConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub prompt_version: String,
    pub concurrency: usize,
}

/// Calls an OCR-capable multimodal LLM over a signed blob URL, bounded by a
/// global concurrency semaphore and a per-document wall-clock timeout.
/// Built the same way the teacher's only LLM HTTP call is
/// built — bearer/header auth, a JSON body, status-code branching, and
/// explicit token-usage extraction — adapted here to a multimodal
/// structured-extraction request.
pub struct OcrClient {
    client: reqwest::Client,
    config: OcrClientConfig,
    semaphore: Arc<Semaphore>,
}

impl OcrClient {
    pub fn new(client: reqwest::Client, config: OcrClientConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
        Self { client, config, semaphore }
    }

    /// Extracts structured content from one PDF chunk blob, never
    /// propagating an error: a failed or timed-out extraction comes back as
    /// an `ExtractionResult` with `success: false` so the caller can persist
    /// it and move on.
    pub async fn extract(
        &self,
        legislation_type: &str,
        identifier: &str,
        signed_url: &str,
        prompt_context: &str,
    ) -> ExtractionResult {
        let _permit = self.semaphore.acquire().await.expect("semaphore never closed");

        let outcome = tokio::time::timeout(
            PER_DOCUMENT_TIMEOUT,
            self.call(legislation_type, identifier, signed_url, prompt_context),
        )
        .await;

        match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!(legislation_type, identifier, "OCR extraction exceeded the 20-minute per-PDF timeout");
                failed_result(legislation_type, identifier, signed_url, "exceeded 20-minute per-PDF timeout")
            }
        }
    }

    async fn call(
        &self,
        legislation_type: &str,
        identifier: &str,
        signed_url: &str,
        prompt_context: &str,
    ) -> ExtractionResult {
        let started = Instant::now();

        let prompt = format!(
            "Extract the structured text content of this historical UK legislation PDF.\n\n{prompt_context}"
        );

        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": 8096,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    { "type": "document", "source": { "type": "url", "url": signed_url } },
                ],
            }],
        });

        let response = match self
            .client
            .post(&self.config.endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return failed_result(legislation_type, identifier, signed_url, &format!("HTTP request failed: {err}")),
        };

        let status = response.status();
        let response_text = match response.text().await {
            Ok(text) => text,
            Err(err) => return failed_result(legislation_type, identifier, signed_url, &format!("failed to read response body: {err}")),
        };

        if !status.is_success() {
            return failed_result(
                legislation_type,
                identifier,
                signed_url,
                &format!("OCR API error ({status}): {response_text}"),
            );
        }

        let parsed: serde_json::Value = match serde_json::from_str(&response_text) {
            Ok(parsed) => parsed,
            Err(err) => return failed_result(legislation_type, identifier, signed_url, &format!("failed to parse response JSON: {err}")),
        };

        let Some(text) = parsed["content"][0]["text"].as_str() else {
            return failed_result(legislation_type, identifier, signed_url, "unexpected response structure (no content[0].text)");
        };

        let input_tokens = parsed["usage"]["input_tokens"].as_u64().unwrap_or(0);
        let output_tokens = parsed["usage"]["output_tokens"].as_u64().unwrap_or(0);
        let cached_tokens = parsed["usage"]["cache_read_input_tokens"].as_u64().unwrap_or(0);
        let response_id = parsed["id"].as_str().unwrap_or_default().to_string();

        info!(legislation_type, identifier, input_tokens, output_tokens, "OCR extraction complete");

        ExtractionResult {
            extracted_data: text.to_string(),
            provenance: ExtractionProvenance {
                source: "llm_ocr".to_string(),
                model: self.config.model.clone(),
                prompt_version: self.config.prompt_version.clone(),
                timestamp: Utc::now(),
                processing_time_seconds: started.elapsed().as_secs_f64(),
                input_tokens,
                output_tokens,
                cached_tokens,
                response_id,
            },
            success: true,
            error: None,
            pdf_source: signed_url.to_string(),
            legislation_type: Some(legislation_type.to_string()),
            identifier: Some(identifier.to_string()),
        }
    }
}

fn failed_result(legislation_type: &str, identifier: &str, signed_url: &str, error: &str) -> ExtractionResult {
    ExtractionResult {
        extracted_data: String::new(),
        provenance: ExtractionProvenance {
            source: "llm_ocr".to_string(),
            model: String::new(),
            prompt_version: String::new(),
            timestamp: Utc::now(),
            processing_time_seconds: 0.0,
            input_tokens: 0,
            output_tokens: 0,
            cached_tokens: 0,
            response_id: String::new(),
        },
        success: false,
        error: Some(error.to_string()),
        pdf_source: signed_url.to_string(),
        legislation_type: Some(legislation_type.to_string()),
        identifier: Some(identifier.to_string()),
    }
}
