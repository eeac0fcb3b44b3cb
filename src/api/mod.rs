//! Abstract connection to the remote search/network API
//!
//! The provider SDK is reduced to one capability: a [`Connection`] that can
//! fetch a page of search results for an id-bounded query, or a page of an
//! account's neighbor list. [`http::HttpConnection`] is the concrete
//! adapter; the crawl algorithms only ever see the trait.

pub mod http;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use http::{Credentials, HttpConnection};
pub use types::{
    IdBounds, NeighborMode, NeighborPage, Post, SearchQuery, NEIGHBOR_CURSOR_START,
};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by a connection
///
/// The taxonomy matters to the session: authentication failures are fatal
/// and never retried, rate-limit violations are recovered internally with
/// a single retry, transient failures propagate to the caller untouched.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication rejected: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Transient network error: {0}")]
    Transient(String),
}

/// Result type for connection operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// One authenticated connection to the remote service
///
/// Implementations must not rate-limit internally; admission control is the
/// session's job. A request that hits the provider's quota must surface as
/// [`ApiError::RateLimited`] with the provider-computed retry-after.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Fetches one page of posts matching `query` within `bounds`
    ///
    /// An empty page means the bounded id range is exhausted; that is a
    /// normal outcome, not an error.
    async fn search(&self, query: &SearchQuery, bounds: IdBounds) -> ApiResult<Vec<Post>>;

    /// Fetches one page of `account`'s neighbor list
    ///
    /// `cursor` follows the provider protocol: [`NEIGHBOR_CURSOR_START`]
    /// opens a fresh walk, the returned page carries the cursor for the
    /// next call (0 when the list is exhausted).
    async fn fetch_neighbors(
        &self,
        account: &str,
        mode: NeighborMode,
        cursor: i64,
    ) -> ApiResult<NeighborPage>;
}

// Sessions own their connection; sharing one authenticated client between a
// friends and a followers crawl goes through an Arc.
#[async_trait]
impl<C> Connection for std::sync::Arc<C>
where
    C: Connection + ?Sized,
{
    async fn search(&self, query: &SearchQuery, bounds: IdBounds) -> ApiResult<Vec<Post>> {
        (**self).search(query, bounds).await
    }

    async fn fetch_neighbors(
        &self,
        account: &str,
        mode: NeighborMode,
        cursor: i64,
    ) -> ApiResult<NeighborPage> {
        (**self).fetch_neighbors(account, mode, cursor).await
    }
}
