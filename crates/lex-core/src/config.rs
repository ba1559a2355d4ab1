//! Process-wide constants: collection names, dimensions, and pool sizes
//! shared by every crate downstream of `lex-core`. The run-configuration
//! shape itself (`{mode, limit, years, ...}`) lives in `lex_pipeline::RunConfig`,
//! closer to the orchestrator that interprets it.

pub mod constants {
    /// Dense embedding dimensionality.
    pub const DENSE_DIM: usize = 1024;
    /// Default PDF OCR chunk size in pages.
    pub const PDF_CHUNK_PAGES: u32 = 40;
    /// Default global PDF OCR concurrency cap.
    pub const PDF_OCR_CONCURRENCY: usize = 10;
    /// Default dense-embedding batch worker-pool size.
    pub const EMBED_BATCH_CONCURRENCY: usize = 50;
    /// Default summary-generation worker-pool size.
    pub const SUMMARY_CONCURRENCY: usize = 25;
    /// RRF fusion constant `k`.
    pub const RRF_K: f64 = 60.0;

    pub const LEGISLATION_COLLECTION: &str = "legislation";
    pub const LEGISLATION_SECTION_COLLECTION: &str = "legislation_section";
    pub const AMENDMENT_COLLECTION: &str = "amendment";
    pub const EXPLANATORY_NOTE_COLLECTION: &str = "explanatory_note";
    pub const CASELAW_COLLECTION: &str = "caselaw";
    pub const CASELAW_SECTION_COLLECTION: &str = "caselaw_section";
    pub const CASELAW_SUMMARY_COLLECTION: &str = "caselaw_summary";
    pub const EMBEDDING_CACHE_COLLECTION: &str = "embedding_cache";
}
