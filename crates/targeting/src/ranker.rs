//! Deal-tier ranking.
//!
//! Each candidate is classified once into a [`RankToken`]: deal-ranked when
//! deal prioritization is on, the candidate carries a deal id and tier, its
//! bidder has a tier rule and the tier meets that rule's minimum; price-ranked
//! otherwise. Deal-ranked candidates outrank every price-ranked one.

use crate::bucket::{price_bucket, price_industry_duration_key};
use adpod_core::{AdPodConfig, Candidate};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankToken {
    PriceRanked { price_bucket: String },
    DealRanked { prefix: String, tier: u32 },
}

impl RankToken {
    /// Leading token of the targeting key.
    pub fn token(&self) -> String {
        match self {
            RankToken::PriceRanked { price_bucket } => price_bucket.clone(),
            RankToken::DealRanked { prefix, tier } => format!("{prefix}{tier}"),
        }
    }

    pub fn is_deal(&self) -> bool {
        matches!(self, RankToken::DealRanked { .. })
    }
}

/// A pod-eligible candidate annotated for ranking.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub candidate: Candidate,
    pub duration_bucket: u32,
    pub rank: RankToken,
    /// Position in the auction's bid list; final tie-break.
    pub arrival: usize,
}

impl RankedCandidate {
    pub fn new(candidate: Candidate, duration_bucket: u32, arrival: usize, config: &AdPodConfig) -> Self {
        let rank = classify(&candidate, config);
        Self {
            candidate,
            duration_bucket,
            rank,
            arrival,
        }
    }

    /// `hb_pb_cat_dur` value. The category segment is present only under
    /// competitive exclusion.
    pub fn targeting_key(&self, with_category: bool) -> String {
        let category = if with_category {
            self.candidate.category.as_deref()
        } else {
            None
        };
        price_industry_duration_key(&self.rank.token(), category, self.duration_bucket)
    }
}

/// Resolve a candidate's rank token.
pub fn classify(candidate: &Candidate, config: &AdPodConfig) -> RankToken {
    let price_ranked = || RankToken::PriceRanked {
        price_bucket: price_bucket(candidate.cpm, config.price_granularity),
    };

    if !config.prioritize_deals || candidate.deal_id.is_none() {
        return price_ranked();
    }
    let Some(tier) = candidate.deal_tier else {
        return price_ranked();
    };
    match config.deal_tier_rule(&candidate.bidder_code) {
        Some(rule) if tier >= rule.min_deal_tier => RankToken::DealRanked {
            prefix: rule.prefix.clone(),
            tier,
        },
        _ => price_ranked(),
    }
}

/// Most-preferred first: deal tier, then price, then arrival.
pub fn priority_cmp(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    let by_price = || b.candidate.cpm.total_cmp(&a.candidate.cpm);
    let by_arrival = || a.arrival.cmp(&b.arrival);

    match (&a.rank, &b.rank) {
        (RankToken::DealRanked { tier: ta, .. }, RankToken::DealRanked { tier: tb, .. }) => tb
            .cmp(ta)
            .then_with(by_price)
            .then_with(by_arrival),
        (RankToken::DealRanked { .. }, RankToken::PriceRanked { .. }) => Ordering::Less,
        (RankToken::PriceRanked { .. }, RankToken::DealRanked { .. }) => Ordering::Greater,
        (RankToken::PriceRanked { .. }, RankToken::PriceRanked { .. }) => {
            by_price().then_with(by_arrival)
        }
    }
}

/// Sort in place, most-preferred first.
pub fn rank(candidates: &mut [RankedCandidate]) {
    candidates.sort_by(priority_cmp);
}
