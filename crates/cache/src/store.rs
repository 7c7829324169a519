//! Cache store abstraction.
//!
//! All backends (Redis, Prebid-Cache style HTTP, in-process) implement the
//! [`CacheStore`] trait so the resolver is decoupled from where creatives
//! actually live.

use adpod_core::{AdPodResult, Candidate};
use async_trait::async_trait;

/// One creative submitted to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePut {
    /// Bid id of the submitting candidate, echoed back by stores that can.
    pub correlation_id: String,
    pub payload: String,
    pub ttl_seconds: u32,
    /// Requested cache key; stores generate one when absent.
    pub key: Option<String>,
}

impl CachePut {
    pub fn for_candidate(candidate: &Candidate, key: Option<String>) -> Self {
        Self {
            correlation_id: candidate.bid_id.clone(),
            payload: candidate.creative.to_cache_payload(),
            ttl_seconds: candidate.ttl_seconds,
            key,
        }
    }
}

/// Store acknowledgement for one put, positionally aligned with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheAck {
    pub cache_id: String,
    pub correlation_id: Option<String>,
}

/// External key-value store for creative payloads.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Store a batch of creatives in one round trip.
    ///
    /// The i-th ack corresponds to the i-th put. A response shorter than the
    /// request means the unmatched tail was not stored.
    async fn store_batch(&self, puts: &[CachePut]) -> AdPodResult<Vec<CacheAck>>;

    /// Store name for metrics/logging.
    fn store_name(&self) -> &str;
}
