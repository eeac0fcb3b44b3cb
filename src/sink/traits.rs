//! Sink trait and error types
//!
//! A sink receives one batch per fetched page. The crawl algorithms never
//! look at what the sink does with a batch; persistence details live
//! entirely behind this trait.

use crate::api::{NeighborMode, Post};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while persisting a batch
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for crawled data, written one page at a time
#[async_trait]
pub trait Sink: Send {
    /// Persists one page of search results
    async fn write_posts(&mut self, posts: &[Post]) -> SinkResult<()>;

    /// Persists one page of an account's neighbor ids
    async fn write_edges(
        &mut self,
        account: &str,
        mode: NeighborMode,
        neighbor_ids: &[u64],
    ) -> SinkResult<()>;
}
