//! Termination policies
//!
//! A termination policy is a caller-supplied pure predicate over one
//! fetched post, deciding whether a crawl must stop early. The search
//! crawler evaluates it only against the first page of a session; see
//! [`crate::crawler::search`] for why.

use crate::api::Post;
use chrono::{DateTime, Utc};

/// Pluggable stop predicate for search crawls
pub trait TerminationPolicy: Send + Sync {
    /// Whether reaching `post` means the crawl has caught up and must stop
    fn should_stop(&self, post: &Post) -> bool;
}

/// Stops once a post at or below a known id boundary is reached
///
/// Used to stitch a new crawl onto an earlier one: pass the highest id the
/// previous crawl collected.
#[derive(Debug, Clone, Copy)]
pub struct IdBound {
    pub since_id: u64,
}

impl TerminationPolicy for IdBound {
    fn should_stop(&self, post: &Post) -> bool {
        post.id <= self.since_id
    }
}

/// Stops once a post older than a cutoff time is reached
#[derive(Debug, Clone, Copy)]
pub struct TimeBound {
    pub cutoff: DateTime<Utc>,
}

impl TerminationPolicy for TimeBound {
    fn should_stop(&self, post: &Post) -> bool {
        post.created_at < self.cutoff
    }
}
