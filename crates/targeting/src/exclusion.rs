//! Competitive exclusion: at most one candidate per
//! (ad unit, category, duration bucket).

use crate::ranker::{priority_cmp, RankedCandidate};
use std::cmp::Ordering;
use std::collections::HashMap;

type ExclusionKey<'a> = (&'a str, Option<&'a str>, u32);

fn exclusion_key(ranked: &RankedCandidate) -> ExclusionKey<'_> {
    (
        ranked.candidate.ad_unit_code.as_str(),
        ranked.candidate.category.as_deref(),
        ranked.duration_bucket,
    )
}

/// Keep the highest-priority candidate of each group. Survivors keep their
/// input order.
pub fn exclude_competitors(candidates: Vec<RankedCandidate>) -> Vec<RankedCandidate> {
    let mut winners: HashMap<ExclusionKey<'_>, usize> = HashMap::new();
    for (idx, candidate) in candidates.iter().enumerate() {
        winners
            .entry(exclusion_key(candidate))
            .and_modify(|best| {
                if priority_cmp(candidate, &candidates[*best]) == Ordering::Less {
                    *best = idx;
                }
            })
            .or_insert(idx);
    }

    let mut keep = vec![false; candidates.len()];
    for idx in winners.into_values() {
        keep[idx] = true;
    }

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(candidate, kept)| kept.then_some(candidate))
        .collect()
}
