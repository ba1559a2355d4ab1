pub mod batch;
pub mod cache;
pub mod dense;
pub mod error;
pub mod sparse;

pub use batch::embed_dense_batch;
pub use cache::{EmbeddingCache, EmbeddingCacheBackend};
pub use dense::{DenseEmbedder, DenseEmbedderConfig};
pub use error::EmbedError;
pub use sparse::{SparseEmbedder, SparseVector};
