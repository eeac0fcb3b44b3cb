//! Plover: a rate-limit-aware social feed collector
//!
//! This crate collects posts and user-network data from a quota-limited
//! polling API. One authenticated [`session::CrawlSession`] drives one
//! connection under one [`budget::RequestBudget`]; the crawl algorithms in
//! [`crawler`] page through result sets and write batches to a [`sink`].

pub mod api;
pub mod budget;
pub mod config;
pub mod crawler;
pub mod session;
pub mod sink;

use thiserror::Error;

/// Main error type for plover operations
///
/// Crawl failures carry the query/entity and cursor position at which they
/// occurred, plus the number of requests already issued, so a caller can
/// resume from the last successful page instead of restarting.
#[derive(Debug, Error)]
pub enum PloverError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] api::ApiError),

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),

    #[error(
        "Search '{query}' failed at max_id={max_id:?} since_id={since_id:?} \
         after {requests_issued} requests: {source}"
    )]
    SearchFailed {
        query: String,
        max_id: Option<u64>,
        since_id: Option<u64>,
        requests_issued: u64,
        source: api::ApiError,
    },

    #[error(
        "Neighbor crawl for '{account}' failed at cursor={cursor} \
         after {requests_issued} requests: {source}"
    )]
    NetworkFailed {
        account: String,
        cursor: i64,
        requests_issued: u64,
        source: api::ApiError,
    },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for plover operations
pub type Result<T> = std::result::Result<T, PloverError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use api::{Connection, NeighborMode, Post};
pub use budget::RequestBudget;
pub use config::Config;
pub use session::CrawlSession;
