//! Scripted connection used by unit tests across the crate

use crate::api::{
    ApiError, ApiResult, Connection, IdBounds, NeighborMode, NeighborPage, Post, SearchQuery,
};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Builds a post whose creation time is derived from its id, so id order
/// and time order agree the way they do for real provider ids.
pub(crate) fn post(id: u64) -> Post {
    Post {
        id,
        created_at: Utc.timestamp_opt(1_504_000_000 + id as i64, 0).unwrap(),
        text: format!("post {}", id),
        author_id: 1,
        author_screen_name: "scripted".to_string(),
    }
}

/// A connection that replays pre-scripted responses and records the
/// bounds/cursors it was called with.
#[derive(Default)]
pub(crate) struct ScriptedConnection {
    search_responses: Mutex<VecDeque<ApiResult<Vec<Post>>>>,
    neighbor_responses: Mutex<VecDeque<ApiResult<NeighborPage>>>,
    pub search_bounds: Mutex<Vec<IdBounds>>,
    pub neighbor_calls: Mutex<Vec<(String, i64)>>,
}

impl ScriptedConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_search(&self, response: ApiResult<Vec<Post>>) {
        self.search_responses.lock().unwrap().push_back(response);
    }

    pub fn push_neighbors(&self, response: ApiResult<NeighborPage>) {
        self.neighbor_responses.lock().unwrap().push_back(response);
    }

    pub fn search_calls(&self) -> usize {
        self.search_bounds.lock().unwrap().len()
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn search(&self, _query: &SearchQuery, bounds: IdBounds) -> ApiResult<Vec<Post>> {
        self.search_bounds.lock().unwrap().push(bounds);
        self.search_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transient("script exhausted".to_string())))
    }

    async fn fetch_neighbors(
        &self,
        account: &str,
        _mode: NeighborMode,
        cursor: i64,
    ) -> ApiResult<NeighborPage> {
        self.neighbor_calls
            .lock()
            .unwrap()
            .push((account.to_string(), cursor));
        self.neighbor_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transient("script exhausted".to_string())))
    }
}
