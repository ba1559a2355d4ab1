pub mod cache;
pub mod client;
pub mod collections;
pub mod error;
pub mod payload;
pub mod search;
pub mod state;
pub mod upsert;

pub use client::VectorStore;
pub use collections::{ensure_collections, ensure_embedding_cache_collection, CollectionSpec, COLLECTIONS};
pub use error::StoreError;
pub use search::{hybrid_search, keyword_search, filter_search, reference_search, FoundPoint, SearchFilters};
pub use state::{count_documents, get_existing_ids, get_existing_ids_with_metadata, scroll_all};
pub use payload::payload_string_field;
pub use upsert::{upsert_batch, upsert_record};
