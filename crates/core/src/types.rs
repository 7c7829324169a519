use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_ttl_seconds() -> u32 {
    300
}

/// A bid received for a pod-eligible ad unit.
///
/// Candidates are read-only inputs: the targeting pipeline filters and
/// reorders them but never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub auction_id: String,
    pub ad_unit_code: String,
    pub bid_id: String,
    pub bidder_code: String,
    pub cpm: f64,
    /// Zero or negative for live/DVR streams.
    pub duration_seconds: i64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub deal_id: Option<String>,
    #[serde(default)]
    pub deal_tier: Option<u32>,
    #[serde(default)]
    pub cache_id: Option<String>,
    pub creative: CreativeRef,
    #[serde(default)]
    pub context: VideoContext,
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u32,
}

impl Candidate {
    /// Only ad-pod video bids take part in pod targeting.
    pub fn is_pod_eligible(&self) -> bool {
        self.context == VideoContext::AdPod
    }

    /// The already-known cache id, if it is non-empty.
    pub fn known_cache_id(&self) -> Option<&str> {
        self.cache_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Media context a bid was returned for.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VideoContext {
    #[default]
    AdPod,
    Instream,
    Outstream,
    Banner,
}

/// Cacheable creative payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CreativeRef {
    VastXml {
        xml: String,
    },
    VastUrl {
        url: String,
        #[serde(default)]
        impression_url: Option<String>,
    },
}

impl CreativeRef {
    /// VAST document submitted to the cache store. URLs are wrapped in a
    /// minimal VAST 3.0 wrapper.
    pub fn to_cache_payload(&self) -> String {
        match self {
            CreativeRef::VastXml { xml } => xml.clone(),
            CreativeRef::VastUrl {
                url,
                impression_url,
            } => {
                let impression = impression_url
                    .as_deref()
                    .map(|imp| format!("<Impression><![CDATA[{imp}]]></Impression>"))
                    .unwrap_or_default();
                format!(
                    "<VAST version=\"3.0\"><Ad><Wrapper><AdSystem>adpod wrapper</AdSystem>\
                     <VASTAdTagURI><![CDATA[{url}]]></VASTAdTagURI>{impression}\
                     <Creatives></Creatives></Wrapper></Ad></VAST>"
                )
            }
        }
    }
}

/// Pod configuration of one ad unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdPodSlot {
    pub ad_unit_code: String,
    pub total_duration_seconds: u32,
    #[serde(default)]
    pub duration_range_seconds: Vec<u32>,
    #[serde(default)]
    pub require_exact_duration: bool,
}

/// Ad-server key/value set emitted for one selected candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetingEntry {
    #[serde(rename = "hb_pb_cat_dur")]
    pub price_industry_duration: String,
    #[serde(rename = "hb_cache_id")]
    pub cache_id: String,
    #[serde(rename = "hb_deal", default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<String>,
}

/// Ad-unit code to ranked key/value sets.
pub type TargetingResult = BTreeMap<String, Vec<TargetingEntry>>;
