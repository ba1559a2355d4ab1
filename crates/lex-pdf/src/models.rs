use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance metadata for LLM-extracted content, persisted alongside the
/// extracted text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionProvenance {
    #[serde(default = "source_default")]
    pub source: String,
    pub model: String,
    pub prompt_version: String,
    pub timestamp: DateTime<Utc>,
    pub processing_time_seconds: f64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(default)]
    pub cached_tokens: u64,
    pub response_id: String,
}

fn source_default() -> String {
    "llm_ocr".to_string()
}

/// Result of one PDF's OCR extraction, with provenance and an optional
/// error when extraction failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub extracted_data: String,
    pub provenance: ExtractionProvenance,
    pub success: bool,
    pub error: Option<String>,
    #[serde(default)]
    pub pdf_source: String,
    pub legislation_type: Option<String>,
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfMetadata {
    pub file_size_bytes: Option<u64>,
    pub page_count: Option<u32>,
    pub pdf_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegislationMetadata {
    pub title: Option<String>,
    pub year: Option<String>,
    pub number: Option<String>,
    pub enactment_date: Option<String>,
    pub r#type: Option<String>,
    pub pdf: Option<PdfMetadata>,
}

impl LegislationMetadata {
    /// Renders the subset of metadata useful as OCR prompt context.
    pub fn to_prompt_context(&self) -> String {
        let mut parts = Vec::new();
        if let Some(title) = &self.title {
            parts.push(format!("Title: {title}"));
        }
        if let Some(year) = &self.year {
            parts.push(format!("Year: {year}"));
        }
        if let Some(number) = &self.number {
            parts.push(format!("Chapter Number: {number}"));
        }
        if let Some(date) = &self.enactment_date {
            parts.push(format!("Enactment Date: {date}"));
        }
        if let Some(pages) = self.pdf.as_ref().and_then(|pdf| pdf.page_count) {
            parts.push(format!("PDF Pages: {pages}"));
        }
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_context_omits_missing_fields() {
        let metadata = LegislationMetadata { title: Some("An Act".to_string()), ..Default::default() };
        assert_eq!(metadata.to_prompt_context(), "Title: An Act");
    }

    #[test]
    fn prompt_context_is_empty_when_nothing_known() {
        assert_eq!(LegislationMetadata::default().to_prompt_context(), "");
    }
}
