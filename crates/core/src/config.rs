use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Root application configuration. Loaded from environment variables
/// with the prefix `ADPOD__` and an optional TOML/JSON config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub adpod: AdPodConfig,
    #[serde(default)]
    pub cache: CacheStoreConfig,
    #[serde(default)]
    pub redis: RedisConfig,
}

/// Per-call configuration snapshot for ad-pod targeting.
#[derive(Debug, Clone, Deserialize)]
pub struct AdPodConfig {
    /// At most one ad per (category, duration) in a pod.
    #[serde(default)]
    pub brand_category_exclusion: bool,
    /// Resolve cache ids through one batched cache-store call.
    #[serde(default)]
    pub defer_caching: bool,
    #[serde(default)]
    pub prioritize_deals: bool,
    /// Bidder code to deal-tier rule.
    #[serde(default)]
    pub deal_tier: HashMap<String, DealTierRule>,
    #[serde(default = "default_max_entries_per_ad_unit")]
    pub max_entries_per_ad_unit: usize,
    #[serde(default)]
    pub price_granularity: PriceGranularity,
    /// Stop emitting once the pod's summed duration would exceed capacity.
    #[serde(default)]
    pub fill_pod_duration: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DealTierRule {
    pub prefix: String,
    #[serde(default)]
    pub min_deal_tier: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceGranularity {
    Low,
    #[default]
    Medium,
    High,
    Auto,
    Dense,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Local,
    Redis,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheStoreConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    #[serde(default = "default_cache_endpoint")]
    pub endpoint: String,
    /// Client-side request timeout for the HTTP store; unset means none.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    #[serde(default = "default_local_max_entries")]
    pub local_max_entries: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_urls")]
    pub urls: Vec<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

// Default functions
fn default_max_entries_per_ad_unit() -> usize {
    3
}
fn default_cache_endpoint() -> String {
    "http://localhost:2424/cache".to_string()
}
fn default_local_max_entries() -> usize {
    100_000
}
fn default_redis_urls() -> Vec<String> {
    vec!["redis://localhost:6379".to_string()]
}
fn default_key_prefix() -> String {
    "adpod:creative:".to_string()
}

impl Default for AdPodConfig {
    fn default() -> Self {
        Self {
            brand_category_exclusion: false,
            defer_caching: false,
            prioritize_deals: false,
            deal_tier: HashMap::new(),
            max_entries_per_ad_unit: default_max_entries_per_ad_unit(),
            price_granularity: PriceGranularity::default(),
            fill_pod_duration: false,
        }
    }
}

impl Default for CacheStoreConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            endpoint: default_cache_endpoint(),
            request_timeout_ms: None,
            local_max_entries: default_local_max_entries(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            urls: default_redis_urls(),
            key_prefix: default_key_prefix(),
        }
    }
}

impl AdPodConfig {
    /// Deal-tier rule for a bidder. Bidders without a rule rank by price.
    pub fn deal_tier_rule(&self, bidder_code: &str) -> Option<&DealTierRule> {
        self.deal_tier.get(bidder_code)
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from an optional file, overridden by environment
    /// variables. A named file must exist. Only `redis.urls` is split on
    /// commas; every other variable is read as a scalar.
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("ADPOD")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("redis.urls"),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AdPodConfig::default();
        assert!(!config.brand_category_exclusion);
        assert!(!config.defer_caching);
        assert!(!config.prioritize_deals);
        assert_eq!(config.max_entries_per_ad_unit, 3);
        assert_eq!(config.price_granularity, PriceGranularity::Medium);
    }

    #[test]
    fn test_deserialize_deal_tier_map() {
        let json = r#"{
            "prioritize_deals": true,
            "deal_tier": {"appnexus": {"prefix": "tier", "min_deal_tier": 5}},
            "price_granularity": "dense"
        }"#;
        let config: AdPodConfig = serde_json::from_str(json).unwrap();
        assert!(config.prioritize_deals);
        assert_eq!(config.price_granularity, PriceGranularity::Dense);
        assert_eq!(config.max_entries_per_ad_unit, 3);
        let rule = config.deal_tier_rule("appnexus").unwrap();
        assert_eq!(rule.prefix, "tier");
        assert_eq!(rule.min_deal_tier, 5);
        assert!(config.deal_tier_rule("rubicon").is_none());
    }

    #[test]
    fn test_env_overrides_string_and_list_values() {
        std::env::set_var("ADPOD__ADPOD__PRICE_GRANULARITY", "dense");
        std::env::set_var("ADPOD__ADPOD__BRAND_CATEGORY_EXCLUSION", "true");
        std::env::set_var("ADPOD__CACHE__BACKEND", "http");
        std::env::set_var("ADPOD__CACHE__ENDPOINT", "http://cache.example/put");
        std::env::set_var("ADPOD__REDIS__KEY_PREFIX", "pods:");
        std::env::set_var("ADPOD__REDIS__URLS", "redis://a:6379,redis://b:6379");

        let loaded = AppConfig::load();

        for key in [
            "ADPOD__ADPOD__PRICE_GRANULARITY",
            "ADPOD__ADPOD__BRAND_CATEGORY_EXCLUSION",
            "ADPOD__CACHE__BACKEND",
            "ADPOD__CACHE__ENDPOINT",
            "ADPOD__REDIS__KEY_PREFIX",
            "ADPOD__REDIS__URLS",
        ] {
            std::env::remove_var(key);
        }

        let config = loaded.unwrap();
        assert_eq!(config.adpod.price_granularity, PriceGranularity::Dense);
        assert!(config.adpod.brand_category_exclusion);
        assert_eq!(config.cache.backend, CacheBackend::Http);
        assert_eq!(config.cache.endpoint, "http://cache.example/put");
        assert_eq!(config.redis.key_prefix, "pods:");
        assert_eq!(config.redis.urls, vec!["redis://a:6379", "redis://b:6379"]);
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let path = std::env::temp_dir().join("adpod-missing-config.toml");
        assert!(AppConfig::load_from(Some(&path)).is_err());
    }

    #[test]
    fn test_file_values_load() {
        let path = std::env::temp_dir().join(format!("adpod-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[adpod]\nprioritize_deals = true\nmax_entries_per_ad_unit = 5\n\n\
             [adpod.deal_tier.appnexus]\nprefix = \"tier\"\nmin_deal_tier = 5\n",
        )
        .unwrap();

        let loaded = AppConfig::load_from(Some(&path));
        std::fs::remove_file(&path).unwrap();

        let config = loaded.unwrap();
        assert!(config.adpod.prioritize_deals);
        assert_eq!(config.adpod.max_entries_per_ad_unit, 5);
        assert_eq!(config.adpod.deal_tier_rule("appnexus").unwrap().min_deal_tier, 5);
    }
}
