//! Ad-pod targeting pipeline: collects pod bids, filters by duration,
//! applies competitive exclusion, ranks deals, resolves cache ids and
//! assembles per-ad-unit targeting.

use crate::assembler::{ResolvedCandidate, TargetingAssembler};
use crate::auction::AuctionCollection;
use crate::bucket::duration_bucket;
use crate::exclusion::exclude_competitors;
use crate::filter::fits_slot;
use crate::ranker::{rank, RankedCandidate};
use adpod_cache::resolver::PendingCreative;
use adpod_cache::{CacheMode, CacheResolver, CacheStore};
use adpod_core::{AdPodConfig, AdPodResult, AdPodSlot, Candidate, TargetingResult};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which ad units to target. `None` means every pod ad unit in the auction.
#[derive(Debug, Clone, Default)]
pub struct TargetingRequest {
    pub codes: Option<Vec<String>>,
}

impl TargetingRequest {
    pub fn all() -> Self {
        Self { codes: None }
    }

    pub fn for_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: Some(codes.into_iter().map(Into::into).collect()),
        }
    }
}

/// Computes ad-pod targeting for one auction collection.
///
/// Holds no per-call state: concurrent calls are independent and each
/// deferred cache batch is scoped to its own call.
pub struct AdPodTargeting {
    auction: Arc<dyn AuctionCollection>,
    cache_store: Option<Arc<dyn CacheStore>>,
}

fn reject(candidate: &Candidate, reason: &'static str) {
    metrics::counter!("adpod.candidates.rejected", "reason" => reason).increment(1);
    debug!(
        bid_id = %candidate.bid_id,
        ad_unit_code = %candidate.ad_unit_code,
        reason,
        "Candidate rejected"
    );
}

impl AdPodTargeting {
    pub fn new(auction: Arc<dyn AuctionCollection>) -> Self {
        Self {
            auction,
            cache_store: None,
        }
    }

    /// Store used when `defer_caching` is enabled.
    pub fn with_cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache_store = Some(store);
        self
    }

    /// Compute targeting for the requested ad units under `config`.
    ///
    /// Rejected candidates are silently absent from the result. Errors are
    /// returned only when the auction collection is unavailable or the
    /// configuration cannot be honored.
    pub async fn get_targeting(
        &self,
        request: &TargetingRequest,
        config: &AdPodConfig,
    ) -> AdPodResult<TargetingResult> {
        metrics::counter!("adpod.targeting.requests").increment(1);

        let resolver = CacheResolver::new(
            CacheMode::from_defer_caching(config.defer_caching),
            self.cache_store.clone(),
        )?;

        let slots = self.auction.ad_pod_slots()?;
        let bids = self.auction.bids_received()?;

        let slots_by_code: HashMap<&str, &AdPodSlot> = slots
            .iter()
            .map(|slot| (slot.ad_unit_code.as_str(), slot))
            .collect();

        let requested = requested_codes(request, &slots);
        let requested_set: HashSet<&str> = requested.iter().map(String::as_str).collect();

        let mut ranked = select_candidates(bids, &requested_set, &slots_by_code, config);

        if config.brand_category_exclusion {
            let before = ranked.len();
            ranked = exclude_competitors(ranked);
            let excluded = before - ranked.len();
            if excluded > 0 {
                metrics::counter!("adpod.candidates.rejected", "reason" => "excluded")
                    .increment(excluded as u64);
                debug!(excluded, "Competitive exclusion removed duplicates");
            }
        }

        rank(&mut ranked);

        let cache_ids = {
            let pending: Vec<PendingCreative<'_>> = ranked
                .iter()
                .map(|r| PendingCreative {
                    candidate: &r.candidate,
                    cache_key: Some(format!(
                        "{}_{}",
                        r.targeting_key(config.brand_category_exclusion),
                        r.candidate.bid_id
                    )),
                })
                .collect();
            resolver.resolve(&pending).await
        };

        let resolved: Vec<ResolvedCandidate> = ranked
            .into_iter()
            .zip(cache_ids)
            .filter_map(|(ranked, cache_id)| {
                cache_id.map(|cache_id| ResolvedCandidate { ranked, cache_id })
            })
            .collect();

        let result = TargetingAssembler::new(config, &slots_by_code).assemble(&requested, resolved);

        let entries: usize = result.values().map(Vec::len).sum();
        metrics::counter!("adpod.targeting.entries").increment(entries as u64);
        info!(
            ad_units = result.len(),
            entries,
            deferred = resolver.mode() == CacheMode::Deferred,
            "Ad pod targeting computed"
        );

        Ok(result)
    }

    /// Callback form of [`get_targeting`](Self::get_targeting). The callback
    /// runs exactly once, with either an error message or the result.
    pub async fn get_targeting_with_callback<F>(
        &self,
        request: &TargetingRequest,
        config: &AdPodConfig,
        callback: F,
    ) where
        F: FnOnce(Option<String>, Option<TargetingResult>),
    {
        match self.get_targeting(request, config).await {
            Ok(result) => callback(None, Some(result)),
            Err(e) => {
                warn!(error = %e, "Ad pod targeting failed");
                callback(Some(e.to_string()), None)
            }
        }
    }
}

/// Explicit codes (deduplicated, in order), or every known pod ad unit.
fn requested_codes(request: &TargetingRequest, slots: &[AdPodSlot]) -> Vec<String> {
    let mut seen: HashSet<&String> = HashSet::new();
    let codes: Vec<&String> = match &request.codes {
        Some(codes) => codes.iter().collect(),
        None => slots.iter().map(|slot| &slot.ad_unit_code).collect(),
    };
    codes
        .into_iter()
        .filter(|code| seen.insert(*code))
        .cloned()
        .collect()
}

/// Pod-eligible candidates for requested ad units that fit their slot,
/// annotated with duration bucket and rank token, in arrival order.
fn select_candidates(
    bids: Vec<Candidate>,
    requested: &HashSet<&str>,
    slots: &HashMap<&str, &AdPodSlot>,
    config: &AdPodConfig,
) -> Vec<RankedCandidate> {
    let mut selected = Vec::with_capacity(bids.len());

    for (arrival, candidate) in bids.into_iter().enumerate() {
        if !requested.contains(candidate.ad_unit_code.as_str()) {
            continue;
        }
        let Some(slot) = slots.get(candidate.ad_unit_code.as_str()) else {
            reject(&candidate, "no_pod_slot");
            continue;
        };
        if !candidate.is_pod_eligible() {
            reject(&candidate, "not_adpod");
            continue;
        }
        if !fits_slot(&candidate, slot) {
            reject(&candidate, "duration");
            continue;
        }
        let has_category = candidate.category.as_deref().is_some_and(|c| !c.is_empty());
        if config.brand_category_exclusion && !has_category {
            reject(&candidate, "missing_category");
            continue;
        }

        let bucket = duration_bucket(candidate.duration_seconds, slot);
        selected.push(RankedCandidate::new(candidate, bucket, arrival, config));
    }

    selected
}
