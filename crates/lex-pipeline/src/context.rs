//! Explicit context object passed into every pipeline run, replacing the
//! process-wide singletons (HTTP client, rate limiter, vector-store client)
//! the redesign guidance in calls out.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use lex_embed::{DenseEmbedder, EmbeddingCache, SparseEmbedder};
use lex_fetch::{Fetcher, FetcherConfig};
use lex_pdf::{ObjectStore, OcrClient};
use lex_store::VectorStore;

/// Everything a pipeline `run(..)` function needs, bundled once at startup
/// and shared (via `Arc`/cheap internal clones) across every kind's
/// orchestrator and every worker spawned from it.
///
/// Two `Fetcher`s are held because case-law scraping uses a
/// distinct rate-limiter profile (harsher growth, no floor delay) from
/// legislation/amendment scraping — both still serialise through their own
/// single shared mutex.
pub struct PipelineContext {
    pub legislation_fetcher: Arc<Fetcher>,
    pub caselaw_fetcher: Arc<Fetcher>,
    pub store: VectorStore,
    pub dense: Arc<DenseEmbedder>,
    pub sparse: SparseEmbedder,
    /// Hybrid query embedding, cache-aware — used by search, not
    /// by record ingestion (records are embedded directly via `dense`/`sparse`).
    pub query_cache: Arc<EmbeddingCache<VectorStore>>,
    pub ocr: Option<Arc<OcrClient>>,
    pub object_store: Option<Arc<dyn ObjectStore>>,
    /// Flipped by the CLI's `ctrl_c` handler; checked between records so an
    /// interrupt lets in-flight work finish without emitting a partial
    /// record mid-parse.
    pub cancelled: Arc<AtomicBool>,
}

impl PipelineContext {
    pub fn new(
        legislation_fetcher: Fetcher,
        caselaw_fetcher: Fetcher,
        store: VectorStore,
        dense: DenseEmbedder,
        sparse: SparseEmbedder,
        ocr: Option<OcrClient>,
        object_store: Option<Arc<dyn ObjectStore>>,
    ) -> Self {
        let query_cache = Arc::new(EmbeddingCache::new(dense.clone(), sparse, store.clone()));
        Self {
            legislation_fetcher: Arc::new(legislation_fetcher),
            caselaw_fetcher: Arc::new(caselaw_fetcher),
            store,
            dense: Arc::new(dense),
            sparse,
            query_cache,
            ocr: ocr.map(Arc::new),
            object_store,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(std::sync::atomic::Ordering::Relaxed)
    }
}

/// Default fetcher pair: legislation/amendment profile and case-law profile
///.
pub fn default_fetchers() -> Result<(Fetcher, Fetcher), lex_fetch::FetchError> {
    Ok((Fetcher::new(FetcherConfig::default())?, Fetcher::new(FetcherConfig::caselaw())?))
}
