use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("qdrant request failed: {0}")]
    Qdrant(#[from] qdrant_client::QdrantError),

    #[error("record could not be serialised into a payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("payload for point {id} could not be decoded into {type_name}: {source}")]
    Decode {
        id: String,
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("point {id} was not found in collection {collection}")]
    NotFound { collection: String, id: String },
}
