//! Deterministic identity: every record's vector-store point id is a UUIDv5
//! over its canonical URI, stable across processes and runs.

use uuid::Uuid;

/// Namespace used for every `uuid5` computation in this workspace.
pub const DNS_NAMESPACE: Uuid = Uuid::NAMESPACE_DNS;

/// Compute the deterministic vector-store point id for a canonical URI.
///
/// `uuid5(DNS_NAMESPACE, uri)`. Two independent calls with the same `uri`
/// always return the same value.
pub fn point_id(uri: &str) -> Uuid {
    Uuid::new_v5(&DNS_NAMESPACE, uri.as_bytes())
}

/// Compute the deterministic embedding-cache point id for a query string.
///
/// `uuid5(DNS_NAMESPACE, sha256(query))`.
pub fn cache_key(query: &str) -> Uuid {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(query.as_bytes());
    let hex = hex_encode(&digest);
    point_id(&hex)
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_across_calls() {
        let a = point_id("http://www.legislation.gov.uk/ukpga/2020/1");
        let b = point_id("http://www.legislation.gov.uk/ukpga/2020/1");
        assert_eq!(a, b);
    }

    #[test]
    fn distinguishes_different_uris() {
        let a = point_id("http://www.legislation.gov.uk/ukpga/2020/1");
        let b = point_id("http://www.legislation.gov.uk/ukpga/2020/2");
        assert_ne!(a, b);
    }

    #[test]
    fn cache_key_stable() {
        let a = cache_key("contract frustration doctrine");
        let b = cache_key("contract frustration doctrine");
        assert_eq!(a, b);
        let c = cache_key("data protection impact assessment");
        assert_ne!(a, c);
    }
}
