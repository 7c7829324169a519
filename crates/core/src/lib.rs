pub mod config;
pub mod error;
pub mod types;

pub use config::{AdPodConfig, AppConfig, DealTierRule, PriceGranularity};
pub use error::{AdPodError, AdPodResult};
pub use types::{AdPodSlot, Candidate, CreativeRef, TargetingEntry, TargetingResult, VideoContext};
