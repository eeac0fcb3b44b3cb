//! Crawl algorithms and their orchestration
//!
//! Three crawl shapes share one [`CrawlSession`](crate::session::CrawlSession):
//!
//! - [`PaginatedSearch`] walks a search result set backward through id space
//! - [`StreamCrawler`] re-runs the search forward on a jittered cadence
//! - [`NetworkCollector`] pages through per-account neighbor lists
//!
//! The `run_*` functions at this level wire a configuration into a live
//! session, sink, and policy, and are what the binary invokes.

mod network;
mod policy;
mod search;
mod stream;

pub use network::{NetworkCollector, NetworkOutcome};
pub use policy::{IdBound, TerminationPolicy, TimeBound};
pub use search::{PaginatedSearch, SearchOutcome};
pub use stream::{Jitter, RandomJitter, StreamCrawler};

use crate::api::http::{Credentials, HttpConnection};
use crate::api::{NeighborMode, SearchQuery};
use crate::budget::RequestBudget;
use crate::config::{Config, SearchConfig};
use crate::session::CrawlSession;
use crate::sink::SqliteSink;
use crate::{ConfigError, PloverError, Result};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Builds an authenticated session from the configuration
fn build_session(config: &Config) -> Result<CrawlSession<HttpConnection>> {
    let credentials = Credentials::load(Path::new(&config.api.credentials_path))?;
    let connection = HttpConnection::new(&config.api.base_url, credentials)?;
    let budget = RequestBudget::new(config.quota.window(), config.quota.max_requests);

    Ok(CrawlSession::new(
        connection,
        budget,
        config.quota.sync_time(),
        config.session.limit,
    ))
}

/// Builds the termination policy from the search configuration, if any
fn build_policy(search: &SearchConfig) -> Result<Option<Box<dyn TerminationPolicy>>> {
    if let Some(since_id) = search.stop_below_id {
        return Ok(Some(Box::new(IdBound { since_id })));
    }

    if let Some(stop_before) = &search.stop_before {
        let cutoff: DateTime<Utc> = DateTime::parse_from_rfc3339(stop_before)
            .map_err(|e| {
                ConfigError::Validation(format!("stop-before must be an RFC 3339 timestamp: {}", e))
            })?
            .with_timezone(&Utc);
        return Ok(Some(Box::new(TimeBound { cutoff })));
    }

    Ok(None)
}

fn build_query(search: &SearchConfig) -> SearchQuery {
    SearchQuery {
        query: search.query.clone(),
        count: search.count,
        result_type: search.result_type.clone(),
    }
}

fn search_config(config: &Config) -> Result<&SearchConfig> {
    config.search.as_ref().ok_or_else(|| {
        PloverError::Config(ConfigError::Validation(
            "a [search] section is required for this crawl".to_string(),
        ))
    })
}

/// Runs one recursive search session per the configuration
///
/// `max_id` and `since_id` override the configured bounds when given,
/// letting an interrupted crawl resume from the position reported in its
/// failure without editing the configuration file.
pub async fn run_search(
    config: &Config,
    max_id: Option<u64>,
    since_id: Option<u64>,
) -> Result<SearchOutcome> {
    let search = search_config(config)?;
    let policy = build_policy(search)?;
    let query = build_query(search);

    let max_id = max_id.or(search.max_id);
    let since_id = since_id.or(search.since_id);

    let mut session = build_session(config)?;
    let mut sink = SqliteSink::new(Path::new(&config.output.database_path))?;

    tracing::info!(
        "Starting search crawl for '{}' (max_id={:?}, since_id={:?})",
        query.query,
        max_id,
        since_id
    );

    let outcome = PaginatedSearch::new(
        &mut session,
        &mut sink,
        query,
        config.session.wait_for(),
        config.session.feedback_time(),
    )
    .run(max_id, since_id, policy.as_deref())
    .await?;

    tracing::info!(
        "Search crawl done: {} posts collected, resume max_id={:?}, latest_id={:?}",
        outcome.collected,
        outcome.final_max_id,
        outcome.latest_id
    );

    Ok(outcome)
}

/// Runs the continuous stream crawl per the configuration
///
/// Returns the total number of posts collected across all rounds. Without
/// a session limit this only returns on error.
pub async fn run_stream(config: &Config) -> Result<u64> {
    let search = search_config(config)?;
    let policy = build_policy(search)?;
    let query = build_query(search);

    let mut session = build_session(config)?;
    let mut sink = SqliteSink::new(Path::new(&config.output.database_path))?;

    tracing::info!(
        "Starting stream crawl for '{}' (delta={:?}, dev-ratio={})",
        query.query,
        config.stream.delta(),
        config.stream.dev_ratio
    );

    StreamCrawler::new(
        &mut session,
        &mut sink,
        query,
        RandomJitter,
        config.stream.delta(),
        config.stream.dev_ratio,
        config.session.wait_for(),
        config.session.feedback_time(),
    )
    .run(policy.as_deref())
    .await
}

/// Runs the neighbor-list crawl per the configuration
pub async fn run_network(config: &Config, mode: NeighborMode) -> Result<NetworkOutcome> {
    let network = config.network.as_ref().ok_or_else(|| {
        PloverError::Config(ConfigError::Validation(
            "a [network] section is required for this crawl".to_string(),
        ))
    })?;

    let mut session = build_session(config)?;
    let mut sink = SqliteSink::new(Path::new(&config.output.database_path))?;

    tracing::info!(
        "Starting network crawl: {} of {} accounts",
        mode,
        network.accounts.len()
    );

    NetworkCollector::new(
        &mut session,
        &mut sink,
        mode,
        config.session.wait_for(),
        config.session.feedback_time(),
    )
    .run(&network.accounts)
    .await
}
