//! HTTP creative store speaking the Prebid Cache wire format.
//!
//! Request:  `{"puts": [{"type": "xml", "value": "...", "ttlseconds": 300, "key": "..."}]}`
//! Response: `{"responses": [{"uuid": "..."}]}`, positionally aligned with `puts`.

use crate::store::{CacheAck, CachePut, CacheStore};
use adpod_core::config::CacheStoreConfig;
use adpod_core::{AdPodError, AdPodResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    puts: Vec<PutItem<'a>>,
}

#[derive(Debug, Serialize)]
struct PutItem<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
    ttlseconds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    #[serde(default)]
    responses: Vec<PutResponseItem>,
}

#[derive(Debug, Deserialize)]
struct PutResponseItem {
    #[serde(default)]
    uuid: String,
}

fn request_body(puts: &[CachePut]) -> PutRequest<'_> {
    PutRequest {
        puts: puts
            .iter()
            .map(|put| PutItem {
                kind: "xml",
                value: &put.payload,
                ttlseconds: put.ttl_seconds,
                key: put.key.as_deref(),
            })
            .collect(),
    }
}

/// Remote cache service client.
pub struct HttpCacheStore {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpCacheStore {
    pub fn new(config: &CacheStoreConfig) -> AdPodResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(ms) = config.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let http = builder
            .build()
            .map_err(|e| AdPodError::Config(format!("cache http client: {e}")))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }
}

fn transport(e: reqwest::Error) -> AdPodError {
    AdPodError::CacheTransport(e.to_string())
}

#[async_trait]
impl CacheStore for HttpCacheStore {
    async fn store_batch(&self, puts: &[CachePut]) -> AdPodResult<Vec<CacheAck>> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&request_body(puts))
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?;

        let text = response.text().await.map_err(transport)?;
        let parsed: PutResponse = serde_json::from_str(&text)
            .map_err(|e| AdPodError::CacheResponse(e.to_string()))?;

        debug!(
            submitted = puts.len(),
            acknowledged = parsed.responses.len(),
            "Cache service responded"
        );

        Ok(parsed
            .responses
            .into_iter()
            .map(|item| CacheAck {
                cache_id: item.uuid,
                correlation_id: None,
            })
            .collect())
    }

    fn store_name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let puts = vec![
            CachePut {
                correlation_id: "bid-1".to_string(),
                payload: "<VAST/>".to_string(),
                ttl_seconds: 300,
                key: Some("15.00_395_30s_bid-1".to_string()),
            },
            CachePut {
                correlation_id: "bid-2".to_string(),
                payload: "<VAST/>".to_string(),
                ttl_seconds: 60,
                key: None,
            },
        ];
        let json = serde_json::to_value(request_body(&puts)).unwrap();
        assert_eq!(json["puts"][0]["type"], "xml");
        assert_eq!(json["puts"][0]["ttlseconds"], 300);
        assert_eq!(json["puts"][0]["key"], "15.00_395_30s_bid-1");
        assert!(json["puts"][1].get("key").is_none());
    }

    #[test]
    fn test_short_response_parses() {
        let parsed: PutResponse =
            serde_json::from_str(r#"{"responses": [{"uuid": "a"}, {"uuid": "b"}]}"#).unwrap();
        assert_eq!(parsed.responses.len(), 2);
        assert_eq!(parsed.responses[1].uuid, "b");

        let empty: PutResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.responses.is_empty());
    }

    #[test]
    fn test_builds_with_timeout() {
        let config = CacheStoreConfig {
            request_timeout_ms: Some(250),
            ..Default::default()
        };
        let store = HttpCacheStore::new(&config).unwrap();
        assert_eq!(store.store_name(), "http");
    }
}
