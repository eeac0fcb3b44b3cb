//! Cursor-driven recursive search crawl
//!
//! [`PaginatedSearch`] walks a result set backward through id space:
//! fetch a page bounded from above by `max_id`, evaluate it, shrink the
//! bound below the page's minimum id, repeat. Three things end a session:
//! the provider returning an empty page (range exhausted), the termination
//! policy matching on the first page, or the session's request cap.
//!
//! The termination policy is evaluated **only against the first page of a
//! session**. Later pages within the same session are already below ids
//! the first page accepted, so re-checking them is skipped deliberately;
//! callers should bound long sessions with `max_id`/`since_id` rather
//! than rely on the policy alone.

use crate::api::{Connection, IdBounds, SearchQuery};
use crate::crawler::policy::TerminationPolicy;
use crate::session::CrawlSession;
use crate::sink::Sink;
use crate::{PloverError, Result};
use std::time::Duration;
use tokio::time::Instant;

/// What a finished search session reports
///
/// `final_max_id` is the upper bound the next fetch would have used;
/// resuming with it continues the backward walk. `latest_id` is the
/// maximum id observed across all pages, used as the `since_id` lower
/// bound of a follow-up session so sessions compose into a continuous
/// backward-then-forward sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    pub final_max_id: Option<u64>,
    pub latest_id: Option<u64>,
    pub collected: u64,
}

/// Recursive search crawl over one session
pub struct PaginatedSearch<'a, C: Connection, S: Sink> {
    session: &'a mut CrawlSession<C>,
    sink: &'a mut S,
    query: SearchQuery,

    /// Pause between page fetches, on top of budget-imposed waits
    page_pause: Duration,

    /// Wall-clock cadence for progress feedback, independent of pages
    feedback_time: Duration,
}

impl<'a, C: Connection, S: Sink> PaginatedSearch<'a, C, S> {
    pub fn new(
        session: &'a mut CrawlSession<C>,
        sink: &'a mut S,
        query: SearchQuery,
        page_pause: Duration,
        feedback_time: Duration,
    ) -> Self {
        Self {
            session,
            sink,
            query,
            page_pause,
            feedback_time,
        }
    }

    /// Runs one search session
    ///
    /// # Arguments
    ///
    /// * `max_id` - Optional initial upper id bound (inclusive)
    /// * `since_id` - Optional lower id bound; when supplied, the
    ///   termination policy is skipped entirely (the explicit bound
    ///   already defines the stopping point) and fetching continues until
    ///   the provider returns an empty page
    /// * `policy` - Stop predicate, evaluated on the first page only
    pub async fn run(
        &mut self,
        max_id: Option<u64>,
        since_id: Option<u64>,
        policy: Option<&dyn TerminationPolicy>,
    ) -> Result<SearchOutcome> {
        let mut max_id = max_id;
        let mut latest_id: Option<u64> = None;
        let mut collected: u64 = 0;
        let mut first_page = true;

        let started = Instant::now();
        let mut last_feedback = started;

        loop {
            // Cooperative cancellation point: between pages only.
            if self.session.is_exhausted() {
                tracing::info!(
                    "Request cap reached after {} requests, ending search session",
                    self.session.requests_issued()
                );
                break;
            }

            let bounds = IdBounds { max_id, since_id };
            let posts = self
                .session
                .search(&self.query, bounds)
                .await
                .map_err(|source| PloverError::SearchFailed {
                    query: self.query.query.clone(),
                    max_id,
                    since_id,
                    requests_issued: self.session.requests_issued(),
                    source,
                })?;

            if posts.is_empty() {
                tracing::debug!("Empty page at max_id={:?}, id range exhausted", max_id);
                break;
            }

            // min/max are safe: the page is non-empty.
            let page_min = posts.iter().map(|p| p.id).min().unwrap();
            let page_max = posts.iter().map(|p| p.id).max().unwrap();
            latest_id = Some(latest_id.map_or(page_max, |seen| seen.max(page_max)));

            // First page of the whole session only, and never under an
            // explicit since_id lower bound.
            let stop = first_page
                && since_id.is_none()
                && policy.is_some_and(|p| posts.iter().any(|post| p.should_stop(post)));

            // The page containing the boundary is persisted in full; no
            // partial-page truncation.
            self.sink.write_posts(&posts).await?;
            collected += posts.len() as u64;
            first_page = false;

            if stop {
                tracing::info!(
                    "Termination policy matched on first page, stopping after {} posts",
                    collected
                );
                break;
            }

            // Strictly shrinking, non-overlapping id ranges.
            max_id = Some(page_min.saturating_sub(1));

            if last_feedback.elapsed() > self.feedback_time {
                tracing::info!(
                    "Search '{}': {} posts collected, {} requests issued, running {:?}",
                    self.query.query,
                    collected,
                    self.session.requests_issued(),
                    started.elapsed()
                );
                last_feedback = Instant::now();
            }

            if self.page_pause > Duration::ZERO {
                tokio::time::sleep(self.page_pause).await;
            }
        }

        Ok(SearchOutcome {
            final_max_id: max_id,
            latest_id,
            collected,
        })
    }
}
