use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp format used by the provider in post payloads,
/// e.g. "Thu Aug 17 22:00:00 +0000 2017".
pub const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// A single collected post
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    /// Provider-assigned id; monotonically ordered by creation time
    pub id: u64,

    /// When the post was created
    pub created_at: DateTime<Utc>,

    /// Post text
    pub text: String,

    /// Id of the authoring account
    pub author_id: u64,

    /// Screen name of the authoring account
    pub author_screen_name: String,
}

/// Search parameters forwarded to the provider on every page fetch
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// The query string (terms, hashtags, mentions)
    pub query: String,

    /// Requested page size
    pub count: u32,

    /// Provider-specific result type selector (e.g. "recent")
    pub result_type: Option<String>,
}

/// Id bounds limiting one search page fetch
///
/// `max_id` is inclusive from above, `since_id` exclusive from below.
/// Both are optional; an unbounded fetch returns the newest page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdBounds {
    pub max_id: Option<u64>,
    pub since_id: Option<u64>,
}

impl IdBounds {
    /// Bounds for an unbounded (newest-first) fetch
    pub fn unbounded() -> Self {
        Self::default()
    }
}

/// Which neighbor set of an account to collect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborMode {
    /// Accounts the target follows
    Friends,
    /// Accounts following the target
    Followers,
}

impl NeighborMode {
    /// Stable label used in logs and in the sink
    pub fn as_str(&self) -> &'static str {
        match self {
            NeighborMode::Friends => "friends",
            NeighborMode::Followers => "followers",
        }
    }
}

impl std::fmt::Display for NeighborMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque paging cursor for neighbor-list fetches
///
/// The provider's cursor protocol: `-1` starts a fresh walk, `0` in a
/// response marks the list as exhausted. Cursors are entity-scoped and
/// reset for every account.
pub const NEIGHBOR_CURSOR_START: i64 = -1;

/// One page of an account's neighbor list
#[derive(Debug, Clone, Deserialize)]
pub struct NeighborPage {
    /// Neighbor account ids on this page
    pub ids: Vec<u64>,

    /// Cursor for the next page; 0 means the list is exhausted
    pub next_cursor: i64,
}

impl NeighborPage {
    /// Whether the provider signalled the end of this account's list
    pub fn is_last(&self) -> bool {
        self.next_cursor == 0
    }
}

/// Wire shape of one search response
#[derive(Debug, Deserialize)]
pub(crate) struct WireSearchResponse {
    pub statuses: Vec<WireStatus>,
}

/// Wire shape of one post as returned by the provider
#[derive(Debug, Deserialize)]
pub(crate) struct WireStatus {
    pub id: u64,
    pub created_at: String,
    pub text: String,
    pub user: WireUser,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireUser {
    pub id: u64,
    pub screen_name: String,
}

impl WireStatus {
    /// Converts a wire post into the internal representation
    ///
    /// Fails when the provider's `created_at` string does not match the
    /// documented timestamp format.
    pub fn into_post(self) -> Result<Post, chrono::ParseError> {
        let created_at = DateTime::parse_from_str(&self.created_at, CREATED_AT_FORMAT)?
            .with_timezone(&Utc);
        Ok(Post {
            id: self.id,
            created_at,
            text: self.text,
            author_id: self.user.id,
            author_screen_name: self.user.screen_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_status_into_post() {
        let wire = WireStatus {
            id: 907170868396216320,
            created_at: "Sun Sep 10 12:00:00 +0000 2017".to_string(),
            text: "match point".to_string(),
            user: WireUser {
                id: 42,
                screen_name: "umpire".to_string(),
            },
        };

        let post = wire.into_post().unwrap();
        assert_eq!(post.id, 907170868396216320);
        assert_eq!(post.author_id, 42);
        assert_eq!(post.author_screen_name, "umpire");
        assert_eq!(post.created_at.to_rfc3339(), "2017-09-10T12:00:00+00:00");
    }

    #[test]
    fn test_wire_status_bad_timestamp() {
        let wire = WireStatus {
            id: 1,
            created_at: "2017-09-10T12:00:00Z".to_string(),
            text: String::new(),
            user: WireUser {
                id: 1,
                screen_name: "x".to_string(),
            },
        };

        assert!(wire.into_post().is_err());
    }

    #[test]
    fn test_neighbor_page_is_last() {
        let page = NeighborPage {
            ids: vec![1, 2, 3],
            next_cursor: 0,
        };
        assert!(page.is_last());

        let page = NeighborPage {
            ids: vec![4],
            next_cursor: 1234,
        };
        assert!(!page.is_last());
    }

    #[test]
    fn test_search_response_deserialize() {
        let json = r#"{
            "statuses": [
                {
                    "id": 10,
                    "created_at": "Thu Aug 17 22:00:00 +0000 2017",
                    "text": "first serve",
                    "user": {"id": 7, "screen_name": "baseline"}
                }
            ]
        }"#;

        let resp: WireSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.statuses.len(), 1);
        assert_eq!(resp.statuses[0].id, 10);
    }
}
