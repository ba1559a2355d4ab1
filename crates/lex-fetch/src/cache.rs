//! Bounded in-process response cache keyed by URL, with TTL and a total
//! byte-size cap. Evicted lazily on insert.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

struct Entry {
    response: CachedResponse,
    inserted_at: Instant,
}

pub struct ResponseCache {
    ttl: Duration,
    max_bytes: usize,
    entries: Mutex<HashMap<String, Entry>>,
    bytes_used: Mutex<usize>,
}

impl ResponseCache {
    pub fn new(ttl: Duration, max_bytes: usize) -> Self {
        Self {
            ttl,
            max_bytes,
            entries: Mutex::new(HashMap::new()),
            bytes_used: Mutex::new(0),
        }
    }

    pub async fn get(&self, url: &str) -> Option<CachedResponse> {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get(url) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.response.clone());
            }
            entries.remove(url);
        }
        None
    }

    pub async fn put(&self, url: String, response: CachedResponse) {
        let size = response.body.len();
        if size > self.max_bytes {
            return;
        }

        let mut entries = self.entries.lock().await;
        let mut used = self.bytes_used.lock().await;

        // Evict oldest entries until there's room (lazy, not a priority queue).
        while *used + size > self.max_bytes && !entries.is_empty() {
            if let Some(oldest_key) = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone())
            {
                if let Some(removed) = entries.remove(&oldest_key) {
                    *used = used.saturating_sub(removed.response.body.len());
                }
            } else {
                break;
            }
        }

        if let Some(old) = entries.insert(
            url,
            Entry {
                response,
                inserted_at: Instant::now(),
            },
        ) {
            *used = used.saturating_sub(old.response.body.len());
        }
        *used += size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_retrieves() {
        let cache = ResponseCache::new(Duration::from_secs(60), 1024);
        cache
            .put(
                "http://x".into(),
                CachedResponse {
                    status: 200,
                    body: b"hello".to_vec(),
                },
            )
            .await;
        let hit = cache.get("http://x").await.unwrap();
        assert_eq!(hit.body, b"hello");
    }

    #[tokio::test]
    async fn expires_after_ttl() {
        let cache = ResponseCache::new(Duration::from_millis(10), 1024);
        cache
            .put(
                "http://x".into(),
                CachedResponse {
                    status: 200,
                    body: b"hello".to_vec(),
                },
            )
            .await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.get("http://x").await.is_none());
    }

    #[tokio::test]
    async fn oversized_entry_is_not_cached() {
        let cache = ResponseCache::new(Duration::from_secs(60), 4);
        cache
            .put(
                "http://x".into(),
                CachedResponse {
                    status: 200,
                    body: b"hello".to_vec(),
                },
            )
            .await;
        assert!(cache.get("http://x").await.is_none());
    }
}
