use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("failed to parse PDF structure: {0}")]
    Malformed(#[from] lopdf::Error),

    #[error("object store request failed: {0}")]
    ObjectStore(String),

    #[error("OCR request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("OCR response was malformed: {0}")]
    MalformedResponse(String),

    #[error("OCR processing of {pdf_url} exceeded the per-document timeout")]
    Timeout { pdf_url: String },
}
