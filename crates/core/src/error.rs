use thiserror::Error;

pub type AdPodResult<T> = Result<T, AdPodError>;

#[derive(Error, Debug)]
pub enum AdPodError {
    #[error("Auction collection unavailable: {0}")]
    AuctionUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cache transport error: {0}")]
    CacheTransport(String),

    #[error("Cache response error: {0}")]
    CacheResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
