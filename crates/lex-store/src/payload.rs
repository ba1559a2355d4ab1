use std::collections::HashMap;

use qdrant_client::Payload;
use qdrant_client::qdrant::Value as QdrantValue;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Serialises a domain record straight into a Qdrant payload. Records are
/// plain serde DTOs, so there is no intermediate field mapping — the
/// payload IS the record.
pub fn record_to_payload<T: Serialize>(record: &T) -> Result<Payload, StoreError> {
    let value = serde_json::to_value(record)?;
    Ok(Payload::try_from(value).unwrap_or_default())
}

/// Decodes a retrieved point's payload back into a domain record. This is a
/// direct constructor over the known schema, not a partial field-by-field
/// reconstruction.
pub fn payload_to_record<T: DeserializeOwned>(
    id: &str,
    payload: HashMap<String, QdrantValue>,
) -> Result<T, StoreError> {
    let value: serde_json::Value = Payload::from(payload).into();
    serde_json::from_value(value).map_err(|source| StoreError::Decode {
        id: id.to_string(),
        type_name: std::any::type_name::<T>(),
        source,
    })
}

/// Reads a string-valued payload field, used by staleness detection to pull
/// `modified_date` back out of a raw metadata lookup without decoding the
/// whole record.
pub fn payload_string_field<'a>(payload: &'a HashMap<String, QdrantValue>, field: &str) -> Option<&'a str> {
    match &payload.get(field)?.kind {
        Some(qdrant_client::qdrant::value::Kind::StringValue(s)) => Some(s.as_str()),
        _ => None,
    }
}
