//! Targeting assembler: per ad unit, emits key/value sets in rank order.

use crate::ranker::RankedCandidate;
use adpod_core::{AdPodConfig, AdPodSlot, TargetingEntry, TargetingResult};
use std::collections::HashMap;

/// A ranked candidate whose cache id has been resolved.
#[derive(Debug, Clone)]
pub struct ResolvedCandidate {
    pub ranked: RankedCandidate,
    pub cache_id: String,
}

pub struct TargetingAssembler<'a> {
    config: &'a AdPodConfig,
    slots: &'a HashMap<&'a str, &'a AdPodSlot>,
}

impl<'a> TargetingAssembler<'a> {
    pub fn new(config: &'a AdPodConfig, slots: &'a HashMap<&'a str, &'a AdPodSlot>) -> Self {
        Self { config, slots }
    }

    /// Build the result map. Every requested code is present, possibly with an
    /// empty sequence; candidates for other codes are ignored.
    ///
    /// `resolved` must already be in rank order.
    pub fn assemble(&self, requested: &[String], resolved: Vec<ResolvedCandidate>) -> TargetingResult {
        let mut by_code: HashMap<String, Vec<ResolvedCandidate>> = HashMap::new();
        for candidate in resolved {
            by_code
                .entry(candidate.ranked.candidate.ad_unit_code.clone())
                .or_default()
                .push(candidate);
        }

        requested
            .iter()
            .map(|code| {
                let candidates = by_code.remove(code).unwrap_or_default();
                (code.clone(), self.entries_for(code, candidates))
            })
            .collect()
    }

    fn entries_for(&self, code: &str, candidates: Vec<ResolvedCandidate>) -> Vec<TargetingEntry> {
        let capacity = self
            .slots
            .get(code)
            .map(|slot| slot.total_duration_seconds)
            .unwrap_or(0);
        let mut filled: u32 = 0;
        let mut entries = Vec::new();

        for resolved in candidates {
            if entries.len() >= self.config.max_entries_per_ad_unit {
                break;
            }
            if resolved.cache_id.is_empty() {
                continue;
            }
            if self.config.fill_pod_duration {
                let next = filled.saturating_add(resolved.ranked.duration_bucket);
                if next > capacity {
                    continue;
                }
                filled = next;
            }
            entries.push(TargetingEntry {
                price_industry_duration: resolved
                    .ranked
                    .targeting_key(self.config.brand_category_exclusion),
                cache_id: resolved.cache_id,
                deal_id: resolved.ranked.candidate.deal_id.clone(),
            });
        }
        entries
    }
}
