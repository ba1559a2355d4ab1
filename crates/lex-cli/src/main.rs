use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use lex_core::config::constants::{
    AMENDMENT_COLLECTION, CASELAW_COLLECTION, CASELAW_SECTION_COLLECTION, EXPLANATORY_NOTE_COLLECTION,
    LEGISLATION_COLLECTION, LEGISLATION_SECTION_COLLECTION,
};
use lex_embed::{DenseEmbedder, DenseEmbedderConfig, SparseEmbedder};
use lex_fetch::{Fetcher, FetcherConfig};
use lex_pdf::{
    chunk::{page_count, split_into_chunks},
    tracking::{completed_key, load_completed, AsyncResultSink},
    ExtractionProvenance, ExtractionResult, HttpObjectStore, ObjectStore, OcrClient, OcrClientConfig,
};
use lex_pipeline::{run_ingest, EnrichmentClient, EnrichmentClientConfig, IngestMode, PipelineContext, RunConfig};
use lex_store::VectorStore;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "lex", version, about = "UK legislation and case-law ingestion/search backend")]
struct Cli {
    /// Qdrant HTTP url.
    #[arg(long, env = "QDRANT_URL", default_value = "http://localhost:6334", global = true)]
    qdrant_url: String,

    /// Qdrant API key, if the instance requires one.
    #[arg(long, env = "QDRANT_API_KEY", global = true)]
    qdrant_api_key: Option<String>,

    /// Dense embedding endpoint.
    #[arg(long, env = "EMBEDDING_ENDPOINT", default_value = "https://api.openai.com/v1/embeddings", global = true)]
    embedding_endpoint: String,

    #[arg(long, env = "EMBEDDING_API_KEY", global = true)]
    embedding_api_key: String,

    #[arg(long, env = "EMBEDDING_MODEL", default_value = "text-embedding-3-large", global = true)]
    embedding_model: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a Stage-1 (+ optional Stage-2) ingest.
    Ingest {
        #[arg(long, value_enum, default_value = "daily")]
        mode: Mode,

        /// Caps the number of scraped/fetched documents per kind; unset runs to exhaustion.
        #[arg(long)]
        limit: Option<usize>,

        /// Comma-separated year list, only meaningful for `--mode full`.
        #[arg(long, value_delimiter = ',')]
        years: Option<Vec<i32>>,

        /// How many years back to consider for amendment-led staleness detection.
        #[arg(long)]
        years_back: Option<i32>,

        /// Run Stage-2 AI enrichment (summaries, explanations) after Stage 1.
        #[arg(long)]
        enable_summaries: bool,

        #[arg(long, env = "ANTHROPIC_API_KEY")]
        anthropic_api_key: Option<String>,

        #[arg(long, env = "ANTHROPIC_MODEL", default_value = "claude-3-5-sonnet-20241022")]
        anthropic_model: String,

        #[arg(long, env = "ANTHROPIC_ENDPOINT", default_value = "https://api.anthropic.com/v1/messages")]
        anthropic_endpoint: String,
    },

    /// Query one collection.
    Search {
        #[arg(long, value_enum)]
        collection: Collection,

        #[arg(long, value_enum, default_value = "hybrid")]
        search_mode: SearchMode,

        /// Free-text query; required for hybrid/keyword search.
        query: Option<String>,

        #[arg(long)]
        court: Vec<String>,

        #[arg(long)]
        division: Vec<String>,

        #[arg(long)]
        legislation_type: Vec<String>,

        #[arg(long)]
        year_min: Option<i32>,

        #[arg(long)]
        year_max: Option<i32>,

        #[arg(long)]
        legislation_id: Option<String>,

        /// For `--search-mode reference`: "legislation" or "caselaw".
        #[arg(long)]
        reference_field: Option<String>,

        #[arg(long)]
        reference_id: Option<String>,

        #[arg(long, default_value_t = 10)]
        limit: u64,

        #[arg(long, default_value_t = 0)]
        offset: u64,
    },

    /// Run the PDF OCR subsystem end-to-end for one historical document.
    PdfOcr {
        #[arg(long)]
        legislation_type: String,

        #[arg(long)]
        identifier: String,

        #[arg(long)]
        pdf_url: String,

        #[arg(long, default_value_t = 40)]
        chunk_size_pages: u32,

        #[arg(long, default_value = "./pdf_results.jsonl")]
        output: PathBuf,

        #[arg(long, env = "PDF_OBJECT_STORE_URL")]
        object_store_url: String,

        #[arg(long, env = "PDF_OBJECT_STORE_SIGNING_SECRET")]
        object_store_signing_secret: String,

        #[arg(long, env = "OCR_ENDPOINT", default_value = "https://api.anthropic.com/v1/messages")]
        ocr_endpoint: String,

        #[arg(long, env = "OCR_API_KEY")]
        ocr_api_key: String,

        #[arg(long, env = "OCR_MODEL", default_value = "claude-3-5-sonnet-20241022")]
        ocr_model: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Daily,
    Full,
    AmendmentsLed,
}

impl From<Mode> for IngestMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Daily => IngestMode::Daily,
            Mode::Full => IngestMode::Full,
            Mode::AmendmentsLed => IngestMode::AmendmentsLed,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Collection {
    Legislation,
    LegislationSection,
    Amendment,
    ExplanatoryNote,
    Caselaw,
    CaselawSection,
}

impl Collection {
    fn name(self) -> &'static str {
        match self {
            Collection::Legislation => LEGISLATION_COLLECTION,
            Collection::LegislationSection => LEGISLATION_SECTION_COLLECTION,
            Collection::Amendment => AMENDMENT_COLLECTION,
            Collection::ExplanatoryNote => EXPLANATORY_NOTE_COLLECTION,
            Collection::Caselaw => CASELAW_COLLECTION,
            Collection::CaselawSection => CASELAW_SECTION_COLLECTION,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SearchMode {
    Hybrid,
    Keyword,
    Filter,
    Reference,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let store = VectorStore::connect(&cli.qdrant_url, cli.qdrant_api_key.as_deref()).context("connecting to qdrant")?;
    lex_store::ensure_collections(&store).await.context("ensuring collections exist")?;
    lex_store::ensure_embedding_cache_collection(&store).await.context("ensuring embedding cache collection exists")?;

    let exit_code = match run(cli, store).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run(cli: Cli, store: VectorStore) -> anyhow::Result<i32> {
    match cli.command {
        Command::Ingest { mode, limit, years, years_back, enable_summaries, anthropic_api_key, anthropic_model, anthropic_endpoint } => {
            run_ingest_command(
                &cli.embedding_endpoint,
                &cli.embedding_api_key,
                &cli.embedding_model,
                store,
                mode.into(),
                limit,
                years,
                years_back,
                enable_summaries,
                anthropic_api_key,
                anthropic_model,
                anthropic_endpoint,
            )
            .await
        }
        Command::Search {
            collection,
            search_mode,
            query,
            court,
            division,
            legislation_type,
            year_min,
            year_max,
            legislation_id,
            reference_field,
            reference_id,
            limit,
            offset,
        } => {
            run_search_command(
                store,
                &cli.embedding_endpoint,
                &cli.embedding_api_key,
                &cli.embedding_model,
                collection,
                search_mode,
                query,
                court,
                division,
                legislation_type,
                year_min,
                year_max,
                legislation_id,
                reference_field,
                reference_id,
                limit,
                offset,
            )
            .await
        }
        Command::PdfOcr {
            legislation_type,
            identifier,
            pdf_url,
            chunk_size_pages,
            output,
            object_store_url,
            object_store_signing_secret,
            ocr_endpoint,
            ocr_api_key,
            ocr_model,
        } => {
            run_pdf_ocr_command(
                legislation_type,
                identifier,
                pdf_url,
                chunk_size_pages,
                output,
                object_store_url,
                object_store_signing_secret,
                ocr_endpoint,
                ocr_api_key,
                ocr_model,
            )
            .await
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_ingest_command(
    embedding_endpoint: &str,
    embedding_api_key: &str,
    embedding_model: &str,
    store: VectorStore,
    mode: IngestMode,
    limit: Option<usize>,
    years: Option<Vec<i32>>,
    years_back: Option<i32>,
    enable_summaries: bool,
    anthropic_api_key: Option<String>,
    anthropic_model: String,
    anthropic_endpoint: String,
) -> anyhow::Result<i32> {
    let legislation_fetcher = Fetcher::new(FetcherConfig::default()).context("building legislation fetcher")?;
    let caselaw_fetcher = Fetcher::new(FetcherConfig::caselaw()).context("building case-law fetcher")?;

    let dense = DenseEmbedder::new(
        reqwest::Client::new(),
        DenseEmbedderConfig::new(embedding_endpoint, embedding_api_key, embedding_model),
    );
    let sparse = SparseEmbedder::new();

    let ctx = PipelineContext::new(legislation_fetcher, caselaw_fetcher, store, dense, sparse, None, None);

    let enrichment_client = anthropic_api_key.map(|api_key| {
        EnrichmentClient::new(
            reqwest::Client::new(),
            EnrichmentClientConfig { endpoint: anthropic_endpoint, api_key, model: anthropic_model, concurrency: 25 },
        )
    });

    if enable_summaries && enrichment_client.is_none() {
        anyhow::bail!("--enable-summaries requires ANTHROPIC_API_KEY (or --anthropic-api-key)");
    }

    let config = RunConfig { mode, limit, years, years_back, enable_summaries, current_year: Utc::now().year() };

    let interrupted = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let cancelled_flag = ctx.cancelled.clone();
    let interrupted_flag = interrupted.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, letting in-flight work finish");
            cancelled_flag.store(true, Ordering::Relaxed);
            interrupted_flag.store(true, Ordering::Relaxed);
        }
    });

    let stats = run_ingest(&ctx, &config, enrichment_client.as_ref()).await;
    println!("{stats}");

    Ok(if interrupted.load(Ordering::Relaxed) {
        130
    } else if stats.aborted > 0 {
        1
    } else {
        0
    })
}

#[allow(clippy::too_many_arguments)]
async fn run_search_command(
    store: VectorStore,
    embedding_endpoint: &str,
    embedding_api_key: &str,
    embedding_model: &str,
    collection: Collection,
    search_mode: SearchMode,
    query: Option<String>,
    court: Vec<String>,
    division: Vec<String>,
    legislation_type: Vec<String>,
    year_min: Option<i32>,
    year_max: Option<i32>,
    legislation_id: Option<String>,
    reference_field: Option<String>,
    reference_id: Option<String>,
    limit: u64,
    offset: u64,
) -> anyhow::Result<i32> {
    let filters = lex_store::SearchFilters {
        court,
        division,
        legislation_type,
        year_min,
        year_max,
        legislation_id,
        reference_field: None,
        reference_id: None,
    };

    let results = match search_mode {
        SearchMode::Hybrid | SearchMode::Keyword => {
            let query = query.context("search query is required for hybrid/keyword search")?;
            let dense = DenseEmbedder::new(
                reqwest::Client::new(),
                DenseEmbedderConfig::new(embedding_endpoint, embedding_api_key, embedding_model),
            );
            let sparse = SparseEmbedder::new();
            let dense_vector = dense.embed(&query).await;
            let sparse_vector = sparse.embed(&query);

            match search_mode {
                SearchMode::Hybrid => {
                    lex_store::hybrid_search(&store, collection.name(), dense_vector, &sparse_vector, &filters, limit, offset)
                        .await
                        .context("hybrid search failed")?
                }
                SearchMode::Keyword => lex_store::keyword_search(&store, collection.name(), &sparse_vector, &filters, limit, offset)
                    .await
                    .context("keyword search failed")?,
                _ => unreachable!(),
            }
        }
        SearchMode::Filter => lex_store::filter_search(&store, collection.name(), &filters, limit as u32)
            .await
            .context("filter search failed")?,
        SearchMode::Reference => {
            let field: &'static str = match reference_field.as_deref() {
                Some("legislation") => "legislation_references",
                Some("caselaw") => "caselaw_references",
                _ => anyhow::bail!("--reference-field must be 'legislation' or 'caselaw'"),
            };
            let reference_id = reference_id.context("--reference-id is required for reference search")?;
            lex_store::reference_search(&store, collection.name(), field, &reference_id, limit as u32)
                .await
                .context("reference search failed")?
        }
    };

    for point in &results {
        let payload: serde_json::Value = qdrant_client::Payload::from(point.payload.clone()).into();
        let line = serde_json::json!({ "id": point.id, "payload": payload });
        println!("{}", serde_json::to_string(&line).unwrap_or_default());
    }
    info!(count = results.len(), "search complete");

    Ok(0)
}

#[allow(clippy::too_many_arguments)]
async fn run_pdf_ocr_command(
    legislation_type: String,
    identifier: String,
    pdf_url: String,
    chunk_size_pages: u32,
    output: PathBuf,
    object_store_url: String,
    object_store_signing_secret: String,
    ocr_endpoint: String,
    ocr_api_key: String,
    ocr_model: String,
) -> anyhow::Result<i32> {
    let key = completed_key(&legislation_type, &identifier);
    let completed = load_completed(&output).await.context("loading completed PDFs")?;
    if completed.contains(&key) {
        info!(%key, "already extracted, skipping");
        return Ok(0);
    }

    let http_client = reqwest::Client::new();
    let pdf_bytes = http_client.get(&pdf_url).send().await.context("fetching source PDF")?.bytes().await.context("reading PDF body")?.to_vec();

    let pages = page_count(&pdf_bytes).context("reading page count")?;
    let chunks = if pages > chunk_size_pages {
        split_into_chunks(&pdf_bytes, chunk_size_pages).context("splitting PDF into chunks")?
    } else {
        vec![lex_pdf::chunk::PdfChunk { bytes: pdf_bytes, start_page: 0, end_page: pages }]
    };

    let object_store = HttpObjectStore::new(http_client.clone(), object_store_url, object_store_signing_secret);
    let ocr_client = OcrClient::new(
        http_client,
        OcrClientConfig { endpoint: ocr_endpoint, api_key: ocr_api_key, model: ocr_model.clone(), prompt_version: "v1".to_string(), concurrency: 10 },
    );

    let started = Instant::now();
    let mut extractions = Vec::with_capacity(chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        let blob_key = format!("{legislation_type}/{identifier}/chunk-{index}.pdf");
        object_store.put(&blob_key, chunk.bytes.clone()).await.context("uploading PDF chunk")?;
        let signed_url = object_store.signed_url(&blob_key, Duration::from_secs(900)).context("signing chunk url")?;

        let prompt_context = format!("Pages {}-{} of {}", chunk.start_page + 1, chunk.end_page, identifier);
        let result = ocr_client.extract(&legislation_type, &identifier, &signed_url, &prompt_context).await;
        extractions.push(result);
    }

    let aggregated = aggregate(&legislation_type, &identifier, &pdf_url, &ocr_model, extractions, started.elapsed());

    let mut sink = AsyncResultSink::open(&output).await.context("opening results file")?;
    sink.append(&aggregated).await.context("appending result")?;

    info!(%key, success = aggregated.success, "pdf ocr complete");
    Ok(0)
}

fn aggregate(
    legislation_type: &str,
    identifier: &str,
    pdf_source: &str,
    model: &str,
    results: Vec<ExtractionResult>,
    elapsed: Duration,
) -> ExtractionResult {
    let success = !results.is_empty() && results.iter().all(|r| r.success);
    let extracted_data = results.iter().map(|r| r.extracted_data.clone()).collect::<Vec<_>>().join("\n\n");
    let input_tokens = results.iter().map(|r| r.provenance.input_tokens).sum();
    let output_tokens = results.iter().map(|r| r.provenance.output_tokens).sum();
    let cached_tokens = results.iter().map(|r| r.provenance.cached_tokens).sum();
    let error = results.iter().find_map(|r| r.error.clone());

    ExtractionResult {
        extracted_data,
        provenance: ExtractionProvenance {
            source: "llm_ocr".to_string(),
            model: model.to_string(),
            prompt_version: "v1".to_string(),
            timestamp: Utc::now(),
            processing_time_seconds: elapsed.as_secs_f64(),
            input_tokens,
            output_tokens,
            cached_tokens,
            response_id: String::new(),
        },
        success,
        error,
        pdf_source: pdf_source.to_string(),
        legislation_type: Some(legislation_type.to_string()),
        identifier: Some(identifier.to_string()),
    }
}
