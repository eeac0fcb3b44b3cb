//! Continuous scheduling wrapper over the recursive search
//!
//! [`StreamCrawler`] is not a pagination algorithm: it repeatedly runs a
//! [`PaginatedSearch`] session with the previous session's `latest_id` as
//! the new `since_id` lower bound, then sleeps a randomized interval so
//! polling does not synchronize with other clients of the same service.
//! A round whose boundary has not moved since the previous round is a
//! no-op and is skipped rather than re-issued.
//!
//! The loop ends only when the session's request cap fires; running
//! "forever" is the normal mode and process supervision is external.

use crate::api::{Connection, SearchQuery};
use crate::crawler::policy::TerminationPolicy;
use crate::crawler::search::PaginatedSearch;
use crate::session::CrawlSession;
use crate::sink::Sink;
use crate::Result;
use rand::Rng;
use std::time::Duration;

/// Source of randomized inter-cycle sleep intervals
///
/// Injectable so tests can assert deterministic bounds instead of real
/// timing.
pub trait Jitter: Send {
    /// Draws one interval centered on `mean` with spread `mean * dev_ratio`
    fn interval(&mut self, mean: Duration, dev_ratio: f64) -> Duration;
}

/// Jitter drawn uniformly from `mean ± mean * dev_ratio`
#[derive(Debug, Default)]
pub struct RandomJitter;

impl Jitter for RandomJitter {
    fn interval(&mut self, mean: Duration, dev_ratio: f64) -> Duration {
        let mean_secs = mean.as_secs_f64();
        let spread = mean_secs * dev_ratio;
        if spread <= 0.0 {
            return mean;
        }
        let secs = rand::rng().random_range((mean_secs - spread)..=(mean_secs + spread));
        Duration::from_secs_f64(secs.max(0.0))
    }
}

/// Continuous polling crawl over one session
pub struct StreamCrawler<'a, C: Connection, S: Sink, J: Jitter> {
    session: &'a mut CrawlSession<C>,
    sink: &'a mut S,
    query: SearchQuery,
    jitter: J,

    /// Mean inter-cycle sleep
    delta: Duration,

    /// Spread of the inter-cycle sleep as a fraction of `delta`
    dev_ratio: f64,

    /// Pause between pages inside each search session
    page_pause: Duration,

    /// Progress feedback cadence forwarded to each search session
    feedback_time: Duration,
}

impl<'a, C: Connection, S: Sink, J: Jitter> StreamCrawler<'a, C, S, J> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: &'a mut CrawlSession<C>,
        sink: &'a mut S,
        query: SearchQuery,
        jitter: J,
        delta: Duration,
        dev_ratio: f64,
        page_pause: Duration,
        feedback_time: Duration,
    ) -> Self {
        Self {
            session,
            sink,
            query,
            jitter,
            delta,
            dev_ratio,
            page_pause,
            feedback_time,
        }
    }

    /// Runs the stream loop until the session's request cap fires
    ///
    /// The termination policy is naturally active only on the first round:
    /// every later round carries a `since_id`, which disables it. Returns
    /// the total number of posts collected across all rounds.
    pub async fn run(&mut self, policy: Option<&dyn TerminationPolicy>) -> Result<u64> {
        // Boundary used by the previous round, if any round ran yet.
        let mut previous_bound: Option<Option<u64>> = None;
        let mut bound: Option<u64> = None;
        let mut total: u64 = 0;

        loop {
            if previous_bound != Some(bound) {
                let outcome = PaginatedSearch::new(
                    &mut *self.session,
                    &mut *self.sink,
                    self.query.clone(),
                    self.page_pause,
                    self.feedback_time,
                )
                .run(None, bound, policy)
                .await?;

                tracing::info!(
                    "Stream round finished: {} posts, latest_id={:?}",
                    outcome.collected,
                    outcome.latest_id
                );

                total += outcome.collected;
                previous_bound = Some(bound);
                // An empty round leaves the boundary where it was.
                if let Some(latest) = outcome.latest_id {
                    bound = Some(latest);
                }
            } else {
                tracing::debug!(
                    "Boundary unchanged at {:?}, skipping duplicate round",
                    bound
                );
            }

            if self.session.is_exhausted() {
                tracing::info!(
                    "Request cap reached after {} requests, ending stream",
                    self.session.requests_issued()
                );
                break;
            }

            let wait = self.jitter.interval(self.delta, self.dev_ratio);
            tracing::debug!("Stream epoch: sleeping {:?}", wait);
            tokio::time::sleep(wait).await;
        }

        Ok(total)
    }
}
