use async_trait::async_trait;
use lex_core::config::constants::EMBEDDING_CACHE_COLLECTION;
use lex_embed::{EmbedError, EmbeddingCacheBackend, SparseVector};
use qdrant_client::qdrant::{GetPointsBuilder, NamedVectors, PointStruct, UpsertPointsBuilder};
use uuid::Uuid;

use crate::client::VectorStore;

#[async_trait]
impl EmbeddingCacheBackend for VectorStore {
    async fn get(&self, id: Uuid) -> Result<Option<(Vec<f32>, SparseVector)>, EmbedError> {
        let response = self
            .client
            .get_points(
                GetPointsBuilder::new(EMBEDDING_CACHE_COLLECTION, vec![id.to_string()])
                    .with_payload(true)
                    .with_vectors(true),
            )
            .await
            .map_err(|err| EmbedError::Cache(err.to_string()))?;

        let Some(point) = response.result.into_iter().next() else {
            return Ok(None);
        };

        let dense = point
            .vectors
            .and_then(|vectors| vectors.vectors_options)
            .and_then(|options| match options {
                qdrant_client::qdrant::vectors::VectorsOptions::Vectors(named) => named.vectors.get("dense").cloned(),
                _ => None,
            })
            .and_then(|vector| vector.vector)
            .map(|dense| dense.data)
            .unwrap_or_default();

        let indices = extract_u32_array(point.payload.get("sparse_indices"));
        let values = extract_f32_array(point.payload.get("sparse_values"));

        Ok(Some((dense, SparseVector { indices, values })))
    }

    async fn put(&self, id: Uuid, query: &str, dense: &[f32], sparse: &SparseVector) -> Result<(), EmbedError> {
        let vectors = NamedVectors::default().add_vector("dense", dense.to_vec());
        let payload = serde_json::json!({
            "query": query,
            "sparse_indices": sparse.indices,
            "sparse_values": sparse.values,
        });
        let payload = qdrant_client::Payload::try_from(payload).unwrap_or_default();

        self.client
            .upsert_points(UpsertPointsBuilder::new(
                EMBEDDING_CACHE_COLLECTION,
                vec![PointStruct::new(id.to_string(), vectors, payload)],
            ))
            .await
            .map_err(|err| EmbedError::Cache(err.to_string()))?;

        Ok(())
    }
}

fn extract_u32_array(value: Option<&qdrant_client::qdrant::Value>) -> Vec<u32> {
    value
        .and_then(|v| match &v.kind {
            Some(qdrant_client::qdrant::value::Kind::ListValue(list)) => Some(
                list.values
                    .iter()
                    .filter_map(|item| match &item.kind {
                        Some(qdrant_client::qdrant::value::Kind::IntegerValue(n)) => Some(*n as u32),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        })
        .unwrap_or_default()
}

fn extract_f32_array(value: Option<&qdrant_client::qdrant::Value>) -> Vec<f32> {
    value
        .and_then(|v| match &v.kind {
            Some(qdrant_client::qdrant::value::Kind::ListValue(list)) => Some(
                list.values
                    .iter()
                    .filter_map(|item| match &item.kind {
                        Some(qdrant_client::qdrant::value::Kind::DoubleValue(n)) => Some(*n as f32),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        })
        .unwrap_or_default()
}
