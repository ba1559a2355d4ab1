//! PDF chunking, blob storage, and bounded multimodal OCR enrichment for
//! historical legislation that predates digitised XML text.

pub mod blob;
pub mod chunk;
pub mod error;
pub mod models;
pub mod ocr;
pub mod tracking;

pub use blob::{HttpObjectStore, ObjectStore};
pub use chunk::{page_count, split_into_chunks, PdfChunk};
pub use error::PdfError;
pub use models::{ExtractionProvenance, ExtractionResult, LegislationMetadata, PdfMetadata};
pub use ocr::{OcrClient, OcrClientConfig};
pub use tracking::{completed_key, load_completed, AsyncResultSink, ResultSink};
