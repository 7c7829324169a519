//! Auction collection seam: where pod slots and received bids come from.

use adpod_core::{AdPodResult, AdPodSlot, Candidate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Read-only view of one auction cycle.
pub trait AuctionCollection: Send + Sync {
    /// All pod-eligible ad units known to the auction.
    fn ad_pod_slots(&self) -> AdPodResult<Vec<AdPodSlot>>;

    /// Bids received, in arrival order.
    fn bids_received(&self) -> AdPodResult<Vec<Candidate>>;
}

/// Captured auction state, loadable from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuctionSnapshot {
    #[serde(default)]
    pub slots: Vec<AdPodSlot>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl AuctionSnapshot {
    pub fn from_json(json: &str) -> AdPodResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> AdPodResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl AuctionCollection for AuctionSnapshot {
    fn ad_pod_slots(&self) -> AdPodResult<Vec<AdPodSlot>> {
        Ok(self.slots.clone())
    }

    fn bids_received(&self) -> AdPodResult<Vec<Candidate>> {
        Ok(self.candidates.clone())
    }
}
