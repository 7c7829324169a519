//! Ad-pod targeting: selects, deduplicates, prioritizes and cache-resolves
//! competing video bids per ad unit, then emits ad-server key/value targeting.

pub mod assembler;
pub mod auction;
pub mod bucket;
pub mod exclusion;
pub mod filter;
pub mod orchestrator;
pub mod ranker;

pub use auction::{AuctionCollection, AuctionSnapshot};
pub use orchestrator::{AdPodTargeting, TargetingRequest};
pub use ranker::{RankToken, RankedCandidate};
