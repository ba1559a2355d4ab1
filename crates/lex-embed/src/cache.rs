use async_trait::async_trait;
use lex_core::identity::cache_key;
use tracing::debug;
use uuid::Uuid;

use crate::dense::DenseEmbedder;
use crate::error::EmbedError;
use crate::sparse::{SparseEmbedder, SparseVector};

/// Storage seam for cached query embeddings, implemented by the vector
/// store so this crate never depends on a concrete database client.
#[async_trait]
pub trait EmbeddingCacheBackend: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<(Vec<f32>, SparseVector)>, EmbedError>;

    async fn put(
        &self,
        id: Uuid,
        query: &str,
        dense: &[f32],
        sparse: &SparseVector,
    ) -> Result<(), EmbedError>;
}

/// Generates hybrid (dense + sparse) embeddings for search queries, caching
/// results under a deterministic id so repeated queries skip the remote
/// embedding call entirely.
pub struct EmbeddingCache<B: EmbeddingCacheBackend> {
    dense: DenseEmbedder,
    sparse: SparseEmbedder,
    backend: B,
}

impl<B: EmbeddingCacheBackend> EmbeddingCache<B> {
    pub fn new(dense: DenseEmbedder, sparse: SparseEmbedder, backend: B) -> Self {
        Self { dense, sparse, backend }
    }

    /// Returns the cached hybrid embedding for `query`, generating and
    /// storing one on a cache miss. Backend failures are logged and treated
    /// as a miss rather than propagated, since a cache is an optimization,
    /// not a correctness requirement.
    pub async fn hybrid(&self, query: &str) -> (Vec<f32>, SparseVector) {
        let id = cache_key(query);

        match self.backend.get(id).await {
            Ok(Some(cached)) => {
                debug!(%id, "embedding cache hit");
                return cached;
            }
            Ok(None) => debug!(%id, "embedding cache miss"),
            Err(err) => debug!(%id, %err, "embedding cache lookup failed, treating as miss"),
        }

        let dense = self.dense.embed(query).await;
        let sparse = self.sparse.embed(query);

        if let Err(err) = self.backend.put(id, query, &dense, &sparse).await {
            debug!(%id, %err, "failed to write embedding cache entry");
        }

        (dense, sparse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct InMemoryBackend {
        entries: Mutex<std::collections::HashMap<Uuid, (Vec<f32>, SparseVector)>>,
    }

    impl InMemoryBackend {
        fn new() -> Self {
            Self { entries: Mutex::new(std::collections::HashMap::new()) }
        }
    }

    #[async_trait]
    impl EmbeddingCacheBackend for InMemoryBackend {
        async fn get(&self, id: Uuid) -> Result<Option<(Vec<f32>, SparseVector)>, EmbedError> {
            Ok(self.entries.lock().unwrap().get(&id).cloned())
        }

        async fn put(
            &self,
            id: Uuid,
            _query: &str,
            dense: &[f32],
            sparse: &SparseVector,
        ) -> Result<(), EmbedError> {
            self.entries.lock().unwrap().insert(id, (dense.to_vec(), sparse.clone()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn cache_key_is_stable_across_calls() {
        let first = cache_key("same query");
        let second = cache_key("same query");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn hybrid_embed_populates_backend_on_miss() {
        let dense = DenseEmbedder::new(
            reqwest::Client::new(),
            crate::dense::DenseEmbedderConfig::new("https://example.test/embed", "key", "model"),
        );
        let sparse = SparseEmbedder::new();
        let backend = InMemoryBackend::new();
        let id = cache_key("hello world");

        assert!(backend.get(id).await.unwrap().is_none());

        // The dense call will fail (no real endpoint) and fall back to a
        // zero vector; the point under test is that the cache still stores
        // whatever was generated and serves it back on the next lookup.
        let cache = EmbeddingCache::new(dense, sparse, backend);
        let (d1, s1) = cache.hybrid("hello world").await;
        let (d2, s2) = cache.hybrid("hello world").await;

        assert_eq!(d1, d2);
        assert_eq!(s1, s2);
    }
}
