//! Resolves cache ids for ranked candidates.
//!
//! Immediate mode trusts ids already carried by the candidates. Deferred mode
//! submits every candidate in one store round trip and matches the
//! acknowledgements back. Neither mode retries, and neither fails the caller:
//! candidates that cannot be resolved come back as `None`.

use crate::store::{CacheAck, CachePut, CacheStore};
use adpod_core::{AdPodError, AdPodResult, Candidate};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    Immediate,
    Deferred,
}

impl CacheMode {
    pub fn from_defer_caching(defer_caching: bool) -> Self {
        if defer_caching {
            CacheMode::Deferred
        } else {
            CacheMode::Immediate
        }
    }
}

/// A candidate awaiting a cache id, with the key to request in deferred mode.
#[derive(Debug, Clone)]
pub struct PendingCreative<'a> {
    pub candidate: &'a Candidate,
    pub cache_key: Option<String>,
}

pub struct CacheResolver {
    mode: CacheMode,
    store: Option<Arc<dyn CacheStore>>,
}

impl CacheResolver {
    /// Deferred mode requires a store.
    pub fn new(mode: CacheMode, store: Option<Arc<dyn CacheStore>>) -> AdPodResult<Self> {
        if mode == CacheMode::Deferred && store.is_none() {
            return Err(AdPodError::Config(
                "deferred caching requires a cache store".to_string(),
            ));
        }
        Ok(Self { mode, store })
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    /// Returns one cache id per pending creative, in input order.
    pub async fn resolve(&self, pending: &[PendingCreative<'_>]) -> Vec<Option<String>> {
        match (self.mode, &self.store) {
            (CacheMode::Deferred, Some(store)) => self.resolve_deferred(store.as_ref(), pending).await,
            _ => resolve_immediate(pending),
        }
    }

    async fn resolve_deferred(
        &self,
        store: &dyn CacheStore,
        pending: &[PendingCreative<'_>],
    ) -> Vec<Option<String>> {
        if pending.is_empty() {
            return Vec::new();
        }

        let puts: Vec<CachePut> = pending
            .iter()
            .map(|p| CachePut::for_candidate(p.candidate, p.cache_key.clone()))
            .collect();

        metrics::counter!("adpod.cache.batches").increment(1);

        let resolved = match store.store_batch(&puts).await {
            Ok(acks) => {
                if acks.len() < puts.len() {
                    debug!(
                        store = store.store_name(),
                        submitted = puts.len(),
                        acknowledged = acks.len(),
                        "Partial cache response"
                    );
                }
                match_acks(&puts, &acks)
            }
            Err(e) => {
                warn!(
                    store = store.store_name(),
                    error = %e,
                    submitted = puts.len(),
                    "Cache store failed, dropping unresolved candidates"
                );
                vec![None; puts.len()]
            }
        };

        let unresolved = resolved.iter().filter(|id| id.is_none()).count();
        if unresolved > 0 {
            metrics::counter!("adpod.cache.unresolved").increment(unresolved as u64);
        }
        resolved
    }
}

fn resolve_immediate(pending: &[PendingCreative<'_>]) -> Vec<Option<String>> {
    pending
        .iter()
        .map(|p| {
            let id = p.candidate.known_cache_id().map(str::to_string);
            if id.is_none() {
                metrics::counter!("adpod.cache.unresolved").increment(1);
                debug!(
                    bid_id = %p.candidate.bid_id,
                    ad_unit_code = %p.candidate.ad_unit_code,
                    "Candidate has no cache id"
                );
            }
            id
        })
        .collect()
}

/// Match acks to puts: by correlation id when every ack carries one,
/// positionally otherwise. Empty ids count as unresolved.
fn match_acks(puts: &[CachePut], acks: &[CacheAck]) -> Vec<Option<String>> {
    let correlated = !acks.is_empty() && acks.iter().all(|a| a.correlation_id.is_some());

    let matched: Vec<Option<String>> = if correlated {
        let mut by_id: HashMap<&str, VecDeque<&str>> = HashMap::new();
        for ack in acks {
            if let Some(corr) = ack.correlation_id.as_deref() {
                by_id.entry(corr).or_default().push_back(ack.cache_id.as_str());
            }
        }
        puts.iter()
            .map(|put| {
                by_id
                    .get_mut(put.correlation_id.as_str())
                    .and_then(|ids| ids.pop_front())
                    .map(str::to_string)
            })
            .collect()
    } else {
        (0..puts.len())
            .map(|i| acks.get(i).map(|ack| ack.cache_id.clone()))
            .collect()
    };

    matched
        .into_iter()
        .map(|id| id.filter(|id| !id.is_empty()))
        .collect()
}
