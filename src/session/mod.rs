//! Crawl session: one connection, one budget, sequential requests
//!
//! A [`CrawlSession`] is created per invocation, authenticated once, used
//! for one logical crawl, then dropped. It wraps every remote call in
//! admission control:
//!
//! 1. compute the budget wait; if positive, sleep it plus `sync_time`
//!    (a fixed margin absorbing clock skew with the remote service);
//! 2. issue the request through the connection;
//! 3. on a provider-reported rate-limit violation, sleep the
//!    provider-computed retry-after (plus `sync_time`) and retry exactly
//!    once;
//! 4. on success, record the issuance and bump the request counter.
//!
//! Authentication failures are fatal and never retried; transient network
//! failures propagate to the caller, which owns any further retry policy.
//!
//! Requests are strictly sequential; the budget's invariant depends on
//! issuances being recorded in order, so a session must never be shared
//! across concurrently-executing crawls.

use crate::api::{ApiError, ApiResult, Connection, IdBounds, NeighborMode, NeighborPage, Post, SearchQuery};
use crate::budget::RequestBudget;
use std::time::Duration;
use tokio::time::Instant;

/// One authenticated run of a crawl against one connection and one budget
pub struct CrawlSession<C: Connection> {
    connection: C,
    budget: RequestBudget,

    /// Extra margin added to every computed wait
    sync_time: Duration,

    /// Optional cap on total requests; reaching it is a terminal condition
    limit: Option<u64>,

    /// Monotonic count of successfully issued requests
    requests_issued: u64,
}

impl<C: Connection> CrawlSession<C> {
    /// Creates a new session
    ///
    /// # Arguments
    ///
    /// * `connection` - The authenticated connection this session owns
    /// * `budget` - The request budget; one budget per session, never shared
    /// * `sync_time` - Safety margin added to every computed wait
    /// * `limit` - Optional total-request cap (`None` = unbounded)
    pub fn new(
        connection: C,
        budget: RequestBudget,
        sync_time: Duration,
        limit: Option<u64>,
    ) -> Self {
        Self {
            connection,
            budget,
            sync_time,
            limit,
            requests_issued: 0,
        }
    }

    /// Issues one admission-controlled search request
    pub async fn search(&mut self, query: &SearchQuery, bounds: IdBounds) -> ApiResult<Vec<Post>> {
        self.admit().await;

        let page = match self.connection.search(query, bounds).await {
            Err(ApiError::RateLimited { retry_after }) => {
                self.wait_out_rate_limit(retry_after).await;
                self.connection.search(query, bounds).await?
            }
            other => other?,
        };

        self.record_issuance();
        Ok(page)
    }

    /// Issues one admission-controlled neighbor-list request
    pub async fn fetch_neighbors(
        &mut self,
        account: &str,
        mode: NeighborMode,
        cursor: i64,
    ) -> ApiResult<NeighborPage> {
        self.admit().await;

        let page = match self.connection.fetch_neighbors(account, mode, cursor).await {
            Err(ApiError::RateLimited { retry_after }) => {
                self.wait_out_rate_limit(retry_after).await;
                self.connection.fetch_neighbors(account, mode, cursor).await?
            }
            other => other?,
        };

        self.record_issuance();
        Ok(page)
    }

    /// Whether the total-request cap has been reached
    ///
    /// Always false when no limit is set. Crawl loops check this between
    /// pages and between entities; there is no mid-request cancellation.
    pub fn is_exhausted(&self) -> bool {
        self.limit.is_some_and(|limit| self.requests_issued >= limit)
    }

    /// Number of requests issued so far in this session
    pub fn requests_issued(&self) -> u64 {
        self.requests_issued
    }

    /// Blocks until the budget admits one more request
    async fn admit(&mut self) {
        let wait = self.budget.time_until_available(Instant::now());
        if wait > Duration::ZERO {
            tracing::debug!(
                "Request budget exhausted, waiting {:?} (+{:?} sync margin)",
                wait,
                self.sync_time
            );
            tokio::time::sleep(wait + self.sync_time).await;
        }
    }

    /// Blocks for the provider-computed retry-after before the single retry
    async fn wait_out_rate_limit(&self, retry_after: Duration) {
        tracing::warn!(
            "Provider reported rate-limit violation, sleeping {:?} (+{:?} sync margin) before retry",
            retry_after,
            self.sync_time
        );
        tokio::time::sleep(retry_after + self.sync_time).await;
    }

    fn record_issuance(&mut self) {
        self.budget.record(Instant::now());
        self.requests_issued += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{post, ScriptedConnection};
    use std::sync::Arc;

    const WINDOW: Duration = Duration::from_secs(900);

    fn query() -> SearchQuery {
        SearchQuery {
            query: "#test".to_string(),
            count: 100,
            result_type: None,
        }
    }

    fn session(
        connection: Arc<ScriptedConnection>,
        max_requests: usize,
        sync_time: Duration,
        limit: Option<u64>,
    ) -> CrawlSession<Arc<ScriptedConnection>> {
        CrawlSession::new(
            connection,
            RequestBudget::new(WINDOW, max_requests),
            sync_time,
            limit,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_fourth_request_blocks_for_window() {
        let conn = Arc::new(ScriptedConnection::new());
        for _ in 0..4 {
            conn.push_search(Ok(vec![post(1)]));
        }
        let mut session = session(conn.clone(), 3, Duration::ZERO, None);

        for _ in 0..3 {
            session.search(&query(), IdBounds::unbounded()).await.unwrap();
        }

        let before = Instant::now();
        session.search(&query(), IdBounds::unbounded()).await.unwrap();
        let blocked = Instant::now() - before;

        assert!(blocked >= WINDOW, "4th request blocked only {:?}", blocked);
        assert!(blocked < WINDOW + Duration::from_secs(1));
        assert_eq!(session.requests_issued(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_margin_added_to_wait() {
        let conn = Arc::new(ScriptedConnection::new());
        conn.push_search(Ok(vec![]));
        conn.push_search(Ok(vec![]));
        let sync_time = Duration::from_secs(15);
        let mut session = session(conn.clone(), 1, sync_time, None);

        session.search(&query(), IdBounds::unbounded()).await.unwrap();

        let before = Instant::now();
        session.search(&query(), IdBounds::unbounded()).await.unwrap();
        let blocked = Instant::now() - before;

        assert!(blocked >= WINDOW + sync_time);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_retried_exactly_once() {
        let conn = Arc::new(ScriptedConnection::new());
        conn.push_search(Err(ApiError::RateLimited {
            retry_after: Duration::from_secs(120),
        }));
        conn.push_search(Ok(vec![post(7)]));
        let mut session = session(conn.clone(), 10, Duration::ZERO, None);

        let before = Instant::now();
        let posts = session.search(&query(), IdBounds::unbounded()).await.unwrap();
        let blocked = Instant::now() - before;

        assert_eq!(posts.len(), 1);
        assert_eq!(conn.search_calls(), 2);
        assert!(blocked >= Duration::from_secs(120));
        // The failed attempt is not counted as an issuance.
        assert_eq!(session.requests_issued(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_rate_limit_propagates() {
        let conn = Arc::new(ScriptedConnection::new());
        for _ in 0..2 {
            conn.push_search(Err(ApiError::RateLimited {
                retry_after: Duration::from_secs(60),
            }));
        }
        let mut session = session(conn.clone(), 10, Duration::ZERO, None);

        let result = session.search(&query(), IdBounds::unbounded()).await;

        assert!(matches!(result, Err(ApiError::RateLimited { .. })));
        assert_eq!(conn.search_calls(), 2);
        assert_eq!(session.requests_issued(), 0);
    }

    #[tokio::test]
    async fn test_authentication_error_not_retried() {
        let conn = Arc::new(ScriptedConnection::new());
        conn.push_search(Err(ApiError::Authentication("bad token".to_string())));
        let mut session = session(conn.clone(), 10, Duration::ZERO, None);

        let result = session.search(&query(), IdBounds::unbounded()).await;

        assert!(matches!(result, Err(ApiError::Authentication(_))));
        assert_eq!(conn.search_calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_error_propagates_unretried() {
        let conn = Arc::new(ScriptedConnection::new());
        conn.push_search(Err(ApiError::Transient("connection reset".to_string())));
        let mut session = session(conn.clone(), 10, Duration::ZERO, None);

        let result = session.search(&query(), IdBounds::unbounded()).await;

        assert!(matches!(result, Err(ApiError::Transient(_))));
        assert_eq!(conn.search_calls(), 1);
        assert_eq!(session.requests_issued(), 0);
    }

    #[tokio::test]
    async fn test_is_exhausted_with_limit() {
        let conn = Arc::new(ScriptedConnection::new());
        conn.push_search(Ok(vec![]));
        conn.push_search(Ok(vec![]));
        let mut session = session(conn.clone(), 10, Duration::ZERO, Some(2));

        assert!(!session.is_exhausted());
        session.search(&query(), IdBounds::unbounded()).await.unwrap();
        assert!(!session.is_exhausted());
        session.search(&query(), IdBounds::unbounded()).await.unwrap();
        assert!(session.is_exhausted());
    }

    #[tokio::test]
    async fn test_unbounded_session_never_exhausted() {
        let conn = Arc::new(ScriptedConnection::new());
        let session = session(conn, 10, Duration::ZERO, None);
        assert!(!session.is_exhausted());
    }
}
