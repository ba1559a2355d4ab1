use lex_core::config::constants::*;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, FieldType, QuantizationType, ScalarQuantizationBuilder,
    SparseVectorParamsBuilder, VectorParamsBuilder,
};
use std::collections::HashMap;
use tracing::info;

use crate::client::VectorStore;
use crate::error::StoreError;

/// Declarative shape of one collection: its name, whether INT8 scalar
/// quantization applies, and
/// which payload fields get an index for filtering.
pub struct CollectionSpec {
    pub name: &'static str,
    pub quantized: bool,
    pub keyword_fields: &'static [&'static str],
    pub integer_fields: &'static [&'static str],
}

/// One entry per kind in the data model.
pub const COLLECTIONS: &[CollectionSpec] = &[
    CollectionSpec {
        name: LEGISLATION_COLLECTION,
        quantized: false,
        keyword_fields: &["id", "legislation_type"],
        integer_fields: &["year", "number"],
    },
    CollectionSpec {
        name: LEGISLATION_SECTION_COLLECTION,
        quantized: false,
        keyword_fields: &["id", "legislation_type"],
        integer_fields: &["year", "number"],
    },
    CollectionSpec {
        name: AMENDMENT_COLLECTION,
        quantized: false,
        keyword_fields: &["id"],
        integer_fields: &["affecting_year"],
    },
    CollectionSpec {
        name: EXPLANATORY_NOTE_COLLECTION,
        quantized: false,
        keyword_fields: &["id", "note_type", "section_type"],
        integer_fields: &["section_number"],
    },
    CollectionSpec {
        name: CASELAW_COLLECTION,
        quantized: true,
        keyword_fields: &["id", "court", "division", "caselaw_references", "legislation_references"],
        integer_fields: &["year", "number"],
    },
    CollectionSpec {
        name: CASELAW_SECTION_COLLECTION,
        quantized: true,
        keyword_fields: &["id", "court", "division"],
        integer_fields: &["year", "number"],
    },
    CollectionSpec {
        name: CASELAW_SUMMARY_COLLECTION,
        quantized: false,
        keyword_fields: &["id", "court", "division"],
        integer_fields: &["year", "number"],
    },
];

/// Creates every collection the pipeline needs if it doesn't exist yet, each
/// with a named `dense` (1024D, COSINE) and `sparse` (BM25, in-memory)
/// vector, then builds the payload indexes [`CollectionSpec`] declares.
pub async fn ensure_collections(store: &VectorStore) -> Result<(), StoreError> {
    for spec in COLLECTIONS {
        ensure_collection(store, spec).await?;
    }
    Ok(())
}

async fn ensure_collection(store: &VectorStore, spec: &CollectionSpec) -> Result<(), StoreError> {
    if store.client.collection_exists(spec.name).await? {
        return Ok(());
    }

    info!(collection = spec.name, quantized = spec.quantized, "creating collection");

    let mut vectors_config = HashMap::new();
    vectors_config.insert("dense".to_string(), VectorParamsBuilder::new(1024, Distance::Cosine).build());

    let mut sparse_vectors_config = HashMap::new();
    sparse_vectors_config.insert("sparse".to_string(), SparseVectorParamsBuilder::default().build());

    let mut builder = CreateCollectionBuilder::new(spec.name)
        .vectors_config(vectors_config)
        .sparse_vectors_config(sparse_vectors_config);

    if spec.quantized {
        builder = builder.quantization_config(
            ScalarQuantizationBuilder::new(QuantizationType::Int8)
                .quantile(0.99)
                .always_ram(true),
        );
    }

    store.client.create_collection(builder).await?;

    for field in spec.keyword_fields {
        store
            .client
            .create_field_index(spec.name, *field, FieldType::Keyword, None, None)
            .await?;
    }
    for field in spec.integer_fields {
        store
            .client
            .create_field_index(spec.name, *field, FieldType::Integer, None, None)
            .await?;
    }

    Ok(())
}

/// Collection holding cached hybrid query embeddings: a single
/// dense vector per point, sparse components kept in the payload instead of
/// a named vector since they are never used for search within this
/// collection, only round-tripped.
pub async fn ensure_embedding_cache_collection(store: &VectorStore) -> Result<(), StoreError> {
    if store.client.collection_exists(EMBEDDING_CACHE_COLLECTION).await? {
        return Ok(());
    }

    info!(collection = EMBEDDING_CACHE_COLLECTION, "creating embedding cache collection");

    let mut vectors_config = HashMap::new();
    vectors_config.insert("dense".to_string(), VectorParamsBuilder::new(1024, Distance::Cosine).build());

    store
        .client
        .create_collection(CreateCollectionBuilder::new(EMBEDDING_CACHE_COLLECTION).vectors_config(vectors_config))
        .await?;

    Ok(())
}
