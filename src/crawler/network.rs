//! Entity-set network crawl
//!
//! [`NetworkCollector`] walks an externally supplied, ordered list of
//! accounts and pages through each account's neighbor set (friends or
//! followers, selected by mode). Unlike the search crawl there is no
//! shrinking id window: pagination cursors are entity-scoped and reset for
//! every account. The only global stop condition is the session's request
//! cap, checked between pages and between accounts.

use crate::api::{Connection, NeighborMode, NEIGHBOR_CURSOR_START};
use crate::session::CrawlSession;
use crate::sink::Sink;
use crate::{PloverError, Result};
use std::time::Duration;
use tokio::time::Instant;

/// What a finished network crawl reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkOutcome {
    /// Accounts whose neighbor list was fully paged
    pub accounts_completed: usize,

    /// Total neighbor edges collected, including partially paged accounts
    pub edges_collected: u64,
}

/// Neighbor-list crawl over one session
pub struct NetworkCollector<'a, C: Connection, S: Sink> {
    session: &'a mut CrawlSession<C>,
    sink: &'a mut S,
    mode: NeighborMode,

    /// Pause between page fetches, on top of budget-imposed waits
    page_pause: Duration,

    /// Wall-clock cadence for progress feedback
    feedback_time: Duration,
}

impl<'a, C: Connection, S: Sink> NetworkCollector<'a, C, S> {
    pub fn new(
        session: &'a mut CrawlSession<C>,
        sink: &'a mut S,
        mode: NeighborMode,
        page_pause: Duration,
        feedback_time: Duration,
    ) -> Self {
        Self {
            session,
            sink,
            mode,
            page_pause,
            feedback_time,
        }
    }

    /// Collects the neighbor sets of `accounts`, in order
    pub async fn run(&mut self, accounts: &[String]) -> Result<NetworkOutcome> {
        let mut accounts_completed = 0;
        let mut edges_collected: u64 = 0;

        let started = Instant::now();
        let mut last_feedback = started;

        'accounts: for account in accounts {
            if self.session.is_exhausted() {
                tracing::info!(
                    "Request cap reached, stopping before account '{}'",
                    account
                );
                break;
            }

            tracing::info!("Collecting {} of '{}'", self.mode, account);

            // Cursor protocol: -1 opens a fresh walk, 0 closes it.
            let mut cursor = NEIGHBOR_CURSOR_START;

            loop {
                if self.session.is_exhausted() {
                    tracing::info!(
                        "Request cap reached mid-list for '{}' at cursor {}",
                        account,
                        cursor
                    );
                    break 'accounts;
                }

                let page = self
                    .session
                    .fetch_neighbors(account, self.mode, cursor)
                    .await
                    .map_err(|source| PloverError::NetworkFailed {
                        account: account.clone(),
                        cursor,
                        requests_issued: self.session.requests_issued(),
                        source,
                    })?;

                self.sink.write_edges(account, self.mode, &page.ids).await?;
                edges_collected += page.ids.len() as u64;

                if last_feedback.elapsed() > self.feedback_time {
                    tracing::info!(
                        "Network crawl: {} accounts done, {} edges, {} requests issued",
                        accounts_completed,
                        edges_collected,
                        self.session.requests_issued()
                    );
                    last_feedback = Instant::now();
                }

                if page.is_last() {
                    break;
                }
                cursor = page.next_cursor;

                if self.page_pause > Duration::ZERO {
                    tokio::time::sleep(self.page_pause).await;
                }
            }

            accounts_completed += 1;
        }

        tracing::info!(
            "Network crawl finished: {}/{} accounts, {} edges",
            accounts_completed,
            accounts.len(),
            edges_collected
        );

        Ok(NetworkOutcome {
            accounts_completed,
            edges_collected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedConnection;
    use crate::api::{ApiError, NeighborPage};
    use crate::budget::RequestBudget;
    use crate::sink::MemorySink;
    use std::sync::Arc;

    fn session(
        conn: Arc<ScriptedConnection>,
        limit: Option<u64>,
    ) -> CrawlSession<Arc<ScriptedConnection>> {
        CrawlSession::new(
            conn,
            RequestBudget::new(Duration::from_secs(900), 100),
            Duration::ZERO,
            limit,
        )
    }

    fn accounts(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_advances_on_cursor_exhaustion_and_resets_per_account() {
        let conn = Arc::new(ScriptedConnection::new());
        // "alice": two pages; "bob": one page.
        conn.push_neighbors(Ok(NeighborPage {
            ids: vec![1, 2],
            next_cursor: 100,
        }));
        conn.push_neighbors(Ok(NeighborPage {
            ids: vec![3],
            next_cursor: 0,
        }));
        conn.push_neighbors(Ok(NeighborPage {
            ids: vec![4],
            next_cursor: 0,
        }));

        let mut session = session(conn.clone(), None);
        let mut sink = MemorySink::new();

        let outcome = NetworkCollector::new(
            &mut session,
            &mut sink,
            NeighborMode::Friends,
            Duration::ZERO,
            Duration::from_secs(900),
        )
        .run(&accounts(&["alice", "bob"]))
        .await
        .unwrap();

        let calls = conn.neighbor_calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                ("alice".to_string(), -1),
                ("alice".to_string(), 100),
                ("bob".to_string(), -1),
            ]
        );

        assert_eq!(outcome.accounts_completed, 2);
        assert_eq!(outcome.edges_collected, 4);
        assert_eq!(sink.edges.len(), 4);
    }

    #[tokio::test]
    async fn test_stops_mid_list_when_cap_fires() {
        let conn = Arc::new(ScriptedConnection::new());
        conn.push_neighbors(Ok(NeighborPage {
            ids: vec![1, 2],
            next_cursor: 50,
        }));
        conn.push_neighbors(Ok(NeighborPage {
            ids: vec![3, 4],
            next_cursor: 60,
        }));
        conn.push_neighbors(Ok(NeighborPage {
            ids: vec![5],
            next_cursor: 0,
        }));

        let mut session = session(conn.clone(), Some(2));
        let mut sink = MemorySink::new();

        let outcome = NetworkCollector::new(
            &mut session,
            &mut sink,
            NeighborMode::Followers,
            Duration::ZERO,
            Duration::from_secs(900),
        )
        .run(&accounts(&["alice"]))
        .await
        .unwrap();

        // Two pages issued, then the cap fired mid-list.
        assert_eq!(conn.neighbor_calls.lock().unwrap().len(), 2);
        assert_eq!(outcome.accounts_completed, 0);
        assert_eq!(outcome.edges_collected, 4);

        // Pages fetched before the cap are persisted.
        assert_eq!(sink.edges.len(), 4);
    }

    #[tokio::test]
    async fn test_cap_checked_between_accounts() {
        let conn = Arc::new(ScriptedConnection::new());
        conn.push_neighbors(Ok(NeighborPage {
            ids: vec![1],
            next_cursor: 0,
        }));

        let mut session = session(conn.clone(), Some(1));
        let mut sink = MemorySink::new();

        let outcome = NetworkCollector::new(
            &mut session,
            &mut sink,
            NeighborMode::Friends,
            Duration::ZERO,
            Duration::from_secs(900),
        )
        .run(&accounts(&["alice", "bob"]))
        .await
        .unwrap();

        // "alice" completed; "bob" never started.
        assert_eq!(conn.neighbor_calls.lock().unwrap().len(), 1);
        assert_eq!(outcome.accounts_completed, 1);
    }

    #[tokio::test]
    async fn test_error_carries_resume_context() {
        let conn = Arc::new(ScriptedConnection::new());
        conn.push_neighbors(Ok(NeighborPage {
            ids: vec![1],
            next_cursor: 77,
        }));
        conn.push_neighbors(Err(ApiError::Transient("reset".to_string())));

        let mut session = session(conn.clone(), None);
        let mut sink = MemorySink::new();

        let error = NetworkCollector::new(
            &mut session,
            &mut sink,
            NeighborMode::Friends,
            Duration::ZERO,
            Duration::from_secs(900),
        )
        .run(&accounts(&["alice"]))
        .await
        .unwrap_err();

        match error {
            PloverError::NetworkFailed {
                account,
                cursor,
                requests_issued,
                ..
            } => {
                assert_eq!(account, "alice");
                assert_eq!(cursor, 77);
                assert_eq!(requests_issued, 1);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
