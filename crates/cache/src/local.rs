//! In-process creative store backed by DashMap for lock-free concurrent access.
//! Used for single-node deployments and tests.

use crate::store::{CacheAck, CachePut, CacheStore};
use adpod_core::AdPodResult;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

struct CacheEntry {
    payload: String,
    inserted_at: Instant,
    ttl: Duration,
}

/// Lock-free local creative store with per-entry TTL.
pub struct LocalCacheStore {
    store: Arc<DashMap<String, CacheEntry>>,
    max_entries: usize,
}

impl LocalCacheStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            max_entries,
        }
    }

    #[cfg(test)]
    fn get(&self, cache_id: &str) -> Option<String> {
        let entry = self.store.get(cache_id)?;
        if entry.inserted_at.elapsed() > entry.ttl {
            drop(entry);
            self.store.remove(cache_id);
            return None;
        }
        Some(entry.payload.clone())
    }

    /// Insert a payload. A full store first drops expired entries; returns
    /// false when it is still full.
    fn put(&self, cache_id: String, payload: String, ttl_seconds: u32) -> bool {
        if self.store.len() >= self.max_entries && !self.store.contains_key(&cache_id) {
            let evicted = self.evict_expired();
            if evicted > 0 {
                debug!(evicted, "Expired creatives evicted from local store");
            }
            if self.store.len() >= self.max_entries {
                return false;
            }
        }
        self.store.insert(
            cache_id,
            CacheEntry {
                payload,
                inserted_at: Instant::now(),
                ttl: Duration::from_secs(u64::from(ttl_seconds)),
            },
        );
        true
    }

    /// Remove expired entries.
    pub fn evict_expired(&self) -> usize {
        let before = self.store.len();
        self.store
            .retain(|_, entry| entry.inserted_at.elapsed() <= entry.ttl);
        before - self.store.len()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[async_trait]
impl CacheStore for LocalCacheStore {
    async fn store_batch(&self, puts: &[CachePut]) -> AdPodResult<Vec<CacheAck>> {
        let mut acks = Vec::with_capacity(puts.len());
        for put in puts {
            let cache_id = put
                .key
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            // A full store acknowledges with an empty id so positions stay aligned.
            let stored = self.put(cache_id.clone(), put.payload.clone(), put.ttl_seconds);
            acks.push(CacheAck {
                cache_id: if stored { cache_id } else { String::new() },
                correlation_id: Some(put.correlation_id.clone()),
            });
        }
        Ok(acks)
    }

    fn store_name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(id: &str, key: Option<&str>) -> CachePut {
        CachePut {
            correlation_id: id.to_string(),
            payload: format!("<VAST>{id}</VAST>"),
            ttl_seconds: 60,
            key: key.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_store_batch_keeps_payloads() {
        let store = LocalCacheStore::new(10);
        let acks = store
            .store_batch(&[put("bid-1", None), put("bid-2", Some("custom"))])
            .await
            .unwrap();

        assert_eq!(acks.len(), 2);
        assert_eq!(acks[0].correlation_id.as_deref(), Some("bid-1"));
        assert_eq!(acks[1].cache_id, "custom");

        assert_eq!(store.get(&acks[0].cache_id).as_deref(), Some("<VAST>bid-1</VAST>"));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_full_store_acks_empty_id() {
        let store = LocalCacheStore::new(1);
        let acks = store
            .store_batch(&[put("bid-1", None), put("bid-2", None)])
            .await
            .unwrap();

        assert!(!acks[0].cache_id.is_empty());
        assert!(acks[1].cache_id.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_entries_expire() {
        let store = LocalCacheStore::new(10);
        let mut expiring = put("bid-1", Some("k"));
        expiring.ttl_seconds = 0;
        store.store_batch(&[expiring]).await.unwrap();

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.evict_expired(), 1);
        assert!(store.is_empty());
        assert!(store.get("k").is_none());
    }

    #[tokio::test]
    async fn test_full_store_reclaims_expired_entries() {
        let store = LocalCacheStore::new(1);
        let mut expiring = put("bid-1", Some("old"));
        expiring.ttl_seconds = 0;
        store.store_batch(&[expiring]).await.unwrap();
        std::thread::sleep(Duration::from_millis(5));

        let acks = store.store_batch(&[put("bid-2", Some("new"))]).await.unwrap();

        assert_eq!(acks[0].cache_id, "new");
        assert_eq!(store.len(), 1);
        assert!(store.get("old").is_none());
        assert_eq!(store.get("new").as_deref(), Some("<VAST>bid-2</VAST>"));
    }
}
