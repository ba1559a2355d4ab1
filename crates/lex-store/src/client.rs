use std::sync::Arc;

use qdrant_client::Qdrant;

use crate::error::StoreError;

/// Thin wrapper around the Qdrant client, shared across workers as an
/// `Arc`.
#[derive(Clone)]
pub struct VectorStore {
    pub(crate) client: Arc<Qdrant>,
}

impl VectorStore {
    pub fn connect(url: &str, api_key: Option<&str>) -> Result<Self, StoreError> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        let client = builder.build()?;
        Ok(Self { client: Arc::new(client) })
    }

    pub fn from_client(client: Qdrant) -> Self {
        Self { client: Arc::new(client) }
    }
}
