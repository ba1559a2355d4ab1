use lex_embed::SparseVector;
use qdrant_client::qdrant::{NamedVectors, PointStruct, UpsertPointsBuilder};
use serde::Serialize;
use uuid::Uuid;

use crate::client::VectorStore;
use crate::error::StoreError;
use crate::payload::record_to_payload;

/// Upserts one record under its deterministic id. Mutations are always
/// upserts, so
/// re-ingesting an unchanged source document is a no-op in effect.
pub async fn upsert_record<T: Serialize>(
    store: &VectorStore,
    collection: &str,
    id: Uuid,
    dense: Vec<f32>,
    sparse: &SparseVector,
    record: &T,
) -> Result<(), StoreError> {
    upsert_batch(store, collection, vec![(id, dense, sparse.clone(), record)]).await
}

/// Upserts many records in a single request. Batch embedding and batch
/// upsert share the same all-or-nothing unit: either the whole batch lands
/// or the request errors and the caller retries it whole.
pub async fn upsert_batch<T: Serialize>(
    store: &VectorStore,
    collection: &str,
    records: Vec<(Uuid, Vec<f32>, SparseVector, &T)>,
) -> Result<(), StoreError> {
    if records.is_empty() {
        return Ok(());
    }

    let mut points = Vec::with_capacity(records.len());
    for (id, dense, sparse, record) in records {
        let vectors = NamedVectors::default()
            .add_vector("dense", dense)
            .add_vector("sparse", qdrant_client::qdrant::Vector::new_sparse(sparse.indices, sparse.values));
        let payload = record_to_payload(record)?;
        points.push(PointStruct::new(id.to_string(), vectors, payload));
    }

    store
        .client
        .upsert_points(UpsertPointsBuilder::new(collection, points))
        .await?;

    Ok(())
}
