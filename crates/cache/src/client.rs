//! Redis-backed creative store.
//! Each batch is written in a single pipelined round trip.

use crate::store::{CacheAck, CachePut, CacheStore};
use adpod_core::config::RedisConfig;
use adpod_core::{AdPodError, AdPodResult};
use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

/// Redis creative store. Cache ids are the keys under `key_prefix`.
pub struct RedisCacheStore {
    client: redis::Client,
    key_prefix: String,
}

impl RedisCacheStore {
    /// Connect to Redis and verify connectivity.
    pub async fn new(config: &RedisConfig) -> AdPodResult<Self> {
        let url = config
            .urls
            .first()
            .cloned()
            .unwrap_or_else(|| "redis://localhost:6379".to_string());

        info!(url = %url, "Connecting to Redis");

        let client = redis::Client::open(url.as_str()).map_err(transport)?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(transport)?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(transport)?;
        info!(response = %pong, "Redis connection established");

        Ok(Self {
            client,
            key_prefix: config.key_prefix.clone(),
        })
    }

    fn redis_key(&self, cache_id: &str) -> String {
        format!("{}{}", self.key_prefix, cache_id)
    }
}

fn transport(e: redis::RedisError) -> AdPodError {
    AdPodError::CacheTransport(e.to_string())
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn store_batch(&self, puts: &[CachePut]) -> AdPodResult<Vec<CacheAck>> {
        let mut pipe = redis::pipe();
        let mut acks = Vec::with_capacity(puts.len());

        for put in puts {
            let cache_id = put
                .key
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            // EX 0 is rejected by Redis.
            let ttl = u64::from(put.ttl_seconds.max(1));
            pipe.cmd("SET")
                .arg(self.redis_key(&cache_id))
                .arg(&put.payload)
                .arg("EX")
                .arg(ttl)
                .ignore();
            acks.push(CacheAck {
                cache_id,
                correlation_id: Some(put.correlation_id.clone()),
            });
        }

        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(transport)?;
        pipe.query_async::<_, ()>(&mut conn)
            .await
            .map_err(transport)?;

        debug!(stored = acks.len(), "Creative batch written to Redis");
        Ok(acks)
    }

    fn store_name(&self) -> &str {
        "redis"
    }
}
