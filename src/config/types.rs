use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for plover
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub quota: QuotaConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub api: ApiConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    pub search: Option<SearchConfig>,
    pub network: Option<NetworkConfig>,
}

/// Request quota configuration
///
/// Defaults follow the provider's standard search quota: 200 requests per
/// 15-minute window.
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaConfig {
    /// Length of the sliding quota window (seconds)
    #[serde(rename = "window-seconds", default = "default_window_seconds")]
    pub window_seconds: u64,

    /// Requests permitted inside one window
    #[serde(rename = "max-requests", default = "default_max_requests")]
    pub max_requests: usize,

    /// Extra margin added to every computed wait, absorbing clock skew
    /// with the remote service (seconds)
    #[serde(rename = "sync-time", default = "default_sync_time")]
    pub sync_time: u64,
}

impl QuotaConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    pub fn sync_time(&self) -> Duration {
        Duration::from_secs(self.sync_time)
    }
}

/// Session behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Optional cap on total requests per session (unset = unbounded)
    pub limit: Option<u64>,

    /// Pause between page fetches, on top of budget waits (seconds)
    #[serde(rename = "wait-for")]
    pub wait_for: u64,

    /// Wall-clock cadence of progress feedback (seconds)
    #[serde(rename = "feedback-time")]
    pub feedback_time: u64,

    /// Enable progress reporting regardless of CLI verbosity
    pub verbose: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            limit: None,
            wait_for: 2,
            feedback_time: 900,
            verbose: false,
        }
    }
}

impl SessionConfig {
    pub fn wait_for(&self) -> Duration {
        Duration::from_secs(self.wait_for)
    }

    pub fn feedback_time(&self) -> Duration {
        Duration::from_secs(self.feedback_time)
    }
}

/// Remote API endpoint and credentials
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API root, e.g. "https://api.example.com/1.1"
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path to the JSON credentials file ({"bearer_token": "..."})
    #[serde(rename = "credentials-path")]
    pub credentials_path: String,
}

/// Search crawl configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// The query string (terms, hashtags, mentions)
    pub query: String,

    /// Page size requested from the provider
    #[serde(default = "default_count")]
    pub count: u32,

    /// Provider-specific result type selector (e.g. "recent")
    #[serde(rename = "result-type")]
    pub result_type: Option<String>,

    /// Initial upper id bound for the backward walk
    #[serde(rename = "max-id")]
    pub max_id: Option<u64>,

    /// Hard lower id bound; disables the termination policy
    #[serde(rename = "since-id")]
    pub since_id: Option<u64>,

    /// Termination policy: stop at posts with id at or below this
    #[serde(rename = "stop-below-id")]
    pub stop_below_id: Option<u64>,

    /// Termination policy: stop at posts created before this RFC 3339 time
    #[serde(rename = "stop-before")]
    pub stop_before: Option<String>,
}

/// Stream crawl configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Mean sleep between polling rounds (seconds)
    #[serde(rename = "delta-seconds")]
    pub delta_seconds: u64,

    /// Spread of the inter-round sleep as a fraction of the mean
    #[serde(rename = "dev-ratio")]
    pub dev_ratio: f64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            delta_seconds: 60,
            dev_ratio: 0.1,
        }
    }
}

impl StreamConfig {
    pub fn delta(&self) -> Duration {
        Duration::from_secs(self.delta_seconds)
    }
}

/// Network crawl configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Ordered list of target accounts
    pub accounts: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_window_seconds() -> u64 {
    900
}

fn default_max_requests() -> usize {
    200
}

fn default_sync_time() -> u64 {
    15
}

fn default_count() -> u32 {
    100
}
