use std::collections::{HashMap, HashSet};

use lex_core::identity::point_id;
use qdrant_client::qdrant::{GetPointsBuilder, ScrollPointsBuilder, Value as QdrantValue};
use tracing::warn;

use crate::client::VectorStore;
use crate::payload::payload_to_record;
use crate::error::StoreError;

const SCROLL_PAGE_SIZE: u32 = 200;

/// Batch existence check against the vector store, replacing file-based
/// tracking: `retrieve()` only returns points that actually exist, so a
/// single round trip tells us which of a candidate set is already ingested.
pub async fn get_existing_ids(store: &VectorStore, collection: &str, doc_ids: &[String]) -> HashSet<String> {
    if doc_ids.is_empty() {
        return HashSet::new();
    }

    let ids: Vec<String> = doc_ids.iter().map(|doc_id| point_id(doc_id).to_string()).collect();

    let response = store
        .client
        .get_points(GetPointsBuilder::new(collection, ids).with_payload(true))
        .await;

    match response {
        Ok(response) => response
            .result
            .into_iter()
            .filter_map(|point| point.payload.get("id").and_then(qdrant_string).map(str::to_string))
            .collect(),
        Err(err) => {
            warn!(collection, %err, "failed to check existing ids, treating all as new");
            HashSet::new()
        }
    }
}

/// Like [`get_existing_ids`] but also returns the requested payload fields,
/// used for staleness detection (amendments-led ingest compares
/// `modified_date` against the amendment stream's affecting year).
pub async fn get_existing_ids_with_metadata(
    store: &VectorStore,
    collection: &str,
    doc_ids: &[String],
) -> HashMap<String, HashMap<String, QdrantValue>> {
    if doc_ids.is_empty() {
        return HashMap::new();
    }

    let ids: Vec<String> = doc_ids.iter().map(|doc_id| point_id(doc_id).to_string()).collect();

    let response = store
        .client
        .get_points(GetPointsBuilder::new(collection, ids).with_payload(true))
        .await;

    match response {
        Ok(response) => response
            .result
            .into_iter()
            .filter_map(|point| {
                let id = point.payload.get("id").and_then(qdrant_string)?.to_string();
                Some((id, point.payload))
            })
            .collect(),
        Err(err) => {
            warn!(collection, %err, "failed to check existing ids with metadata, treating all as new");
            HashMap::new()
        }
    }
}

pub async fn count_documents(store: &VectorStore, collection: &str) -> u64 {
    match store.client.collection_info(collection).await {
        Ok(info) => info.result.and_then(|r| r.points_count).unwrap_or(0),
        Err(err) => {
            warn!(collection, %err, "failed to count documents, defaulting to 0");
            0
        }
    }
}

/// Walks an entire collection via cursor-based scroll, decoding every
/// point's payload back into `T`. Used by Stage 2 to enumerate candidates
/// for enrichment — there is no narrower query than "all of them" since
/// enrichment state (has a summary id, has an `ai_explanation`) lives on a
/// different record than the one being scrolled.
pub async fn scroll_all<T: serde::de::DeserializeOwned>(store: &VectorStore, collection: &str) -> Result<Vec<T>, StoreError> {
    let mut records = Vec::new();
    let mut offset = None;

    loop {
        let mut builder = ScrollPointsBuilder::new(collection).with_payload(true).limit(SCROLL_PAGE_SIZE);
        if let Some(point_id) = offset.take() {
            builder = builder.offset(point_id);
        }

        let response = store.client.scroll(builder).await?;
        for point in response.result {
            let id = point
                .id
                .as_ref()
                .map(|id| format!("{id:?}"))
                .unwrap_or_default();
            match payload_to_record::<T>(&id, point.payload) {
                Ok(record) => records.push(record),
                Err(err) => warn!(collection, %err, "skipping point with undecodable payload during scroll"),
            }
        }

        offset = response.next_page_offset;
        if offset.is_none() {
            break;
        }
    }

    Ok(records)
}

fn qdrant_string(value: &QdrantValue) -> Option<&str> {
    match &value.kind {
        Some(qdrant_client::qdrant::value::Kind::StringValue(s)) => Some(s.as_str()),
        _ => None,
    }
}
