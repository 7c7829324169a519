#![warn(clippy::unwrap_used)]

pub mod client;
pub mod http;
pub mod local;
pub mod resolver;
pub mod store;

pub use client::RedisCacheStore;
pub use http::HttpCacheStore;
pub use local::LocalCacheStore;
pub use resolver::{CacheMode, CacheResolver};
pub use store::{CacheAck, CachePut, CacheStore};
