//! adpod-cli: computes ad-pod targeting for a captured auction.
//!
//! Reads an auction snapshot (pod slots plus received bids) as JSON, runs the
//! targeting pipeline and prints the per-ad-unit key/value sets.

use adpod_cache::{CacheStore, HttpCacheStore, LocalCacheStore, RedisCacheStore};
use adpod_core::config::{AppConfig, CacheBackend};
use adpod_targeting::{AdPodTargeting, AuctionSnapshot, TargetingRequest};
use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "adpod-cli")]
#[command(about = "Ad-pod targeting for competing video bids")]
#[command(version)]
struct Cli {
    /// Auction snapshot JSON file
    #[arg(long)]
    snapshot: PathBuf,

    /// Ad-unit codes to target (default: every pod ad unit)
    #[arg(long, value_delimiter = ',')]
    codes: Option<Vec<String>>,

    /// Config file layered under ADPOD__* environment variables
    #[arg(long, env = "ADPOD_CONFIG")]
    config: Option<PathBuf>,

    /// Cache store backend for deferred caching (overrides config)
    #[arg(long, value_parser = parse_backend)]
    store: Option<CacheBackend>,

    /// Resolve cache ids through the store (overrides config)
    #[arg(long, default_value_t = false)]
    defer_caching: bool,
}

fn parse_backend(value: &str) -> Result<CacheBackend, String> {
    match value {
        "local" => Ok(CacheBackend::Local),
        "redis" => Ok(CacheBackend::Redis),
        "http" => Ok(CacheBackend::Http),
        other => Err(format!("unknown cache store: {other}")),
    }
}

/// A file named on the command line must load; without one, unreadable
/// environment settings fall back to defaults.
fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(Some(path))
            .with_context(|| format!("failed to load config file {}", path.display())),
        None => Ok(AppConfig::load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        })),
    }
}

async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn CacheStore>> {
    let store: Arc<dyn CacheStore> = match config.cache.backend {
        CacheBackend::Local => Arc::new(LocalCacheStore::new(config.cache.local_max_entries)),
        CacheBackend::Redis => Arc::new(RedisCacheStore::new(&config.redis).await?),
        CacheBackend::Http => Arc::new(HttpCacheStore::new(&config.cache)?),
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adpod_cli=info,adpod_targeting=info,adpod_cache=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(backend) = cli.store {
        config.cache.backend = backend;
    }
    if cli.defer_caching {
        config.adpod.defer_caching = true;
    }

    info!(
        snapshot = %cli.snapshot.display(),
        defer_caching = config.adpod.defer_caching,
        brand_category_exclusion = config.adpod.brand_category_exclusion,
        prioritize_deals = config.adpod.prioritize_deals,
        "Configuration loaded"
    );

    let snapshot = AuctionSnapshot::from_file(&cli.snapshot)
        .with_context(|| format!("failed to read snapshot {}", cli.snapshot.display()))?;

    let mut targeting = AdPodTargeting::new(Arc::new(snapshot));
    if config.adpod.defer_caching {
        targeting = targeting.with_cache_store(build_store(&config).await?);
    }

    let request = TargetingRequest { codes: cli.codes };
    let result = targeting.get_targeting(&request, &config.adpod).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_config_file_must_exist() {
        let path = std::env::temp_dir().join("adpod-cli-no-such-config.toml");
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("adpod-cli-no-such-config.toml"));
    }

    #[test]
    fn test_named_config_file_is_applied() {
        let path = std::env::temp_dir().join(format!("adpod-cli-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[adpod]\nbrand_category_exclusion = true\n").unwrap();

        let loaded = load_config(Some(&path));
        std::fs::remove_file(&path).unwrap();

        assert!(loaded.unwrap().adpod.brand_category_exclusion);
    }

    #[test]
    fn test_parse_backend() {
        assert_eq!(parse_backend("redis"), Ok(CacheBackend::Redis));
        assert!(parse_backend("memcached").is_err());
    }
}
