//! In-memory sink
//!
//! Buffers everything it receives. Used by unit tests to assert exactly
//! which pages a crawl persisted, and handy for dry runs against small
//! result sets.

use crate::api::{NeighborMode, Post};
use crate::sink::traits::{Sink, SinkResult};
use async_trait::async_trait;

/// Sink that keeps all batches in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub posts: Vec<Post>,
    pub edges: Vec<(String, NeighborMode, u64)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn write_posts(&mut self, posts: &[Post]) -> SinkResult<()> {
        self.posts.extend_from_slice(posts);
        Ok(())
    }

    async fn write_edges(
        &mut self,
        account: &str,
        mode: NeighborMode,
        neighbor_ids: &[u64],
    ) -> SinkResult<()> {
        for id in neighbor_ids {
            self.edges.push((account.to_string(), mode, *id));
        }
        Ok(())
    }
}
