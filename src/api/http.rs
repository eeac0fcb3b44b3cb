//! HTTP adapter for the remote search/network API
//!
//! Implements [`Connection`] on top of `reqwest`. The adapter owns
//! authentication (a bearer token loaded from a JSON credentials file) and
//! the mapping from HTTP status codes to the [`ApiError`] taxonomy:
//!
//! | Condition | Mapped to |
//! |-----------|-----------|
//! | HTTP 401 / 403 | `Authentication` (fatal) |
//! | HTTP 429 | `RateLimited` with provider retry-after |
//! | Other non-2xx | `Transient` |
//! | Timeout / connect / decode | `Transient` |

use crate::api::types::{WireSearchResponse, NeighborPage};
use crate::api::{ApiError, ApiResult, Connection, IdBounds, NeighborMode, Post, SearchQuery};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Fallback wait when the provider reports a rate-limit violation without a
/// usable retry-after header.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Credentials for the remote service, loaded from a JSON side file
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub bearer_token: String,
}

impl Credentials {
    /// Loads credentials from a JSON file, e.g. `{"bearer_token": "..."}`
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

/// Concrete [`Connection`] backed by an HTTP client
pub struct HttpConnection {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl HttpConnection {
    /// Creates a new connection against `base_url`
    ///
    /// The base URL points at the provider's API root, without a trailing
    /// slash (e.g. `https://api.example.com/1.1`).
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("plover/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Checks the response status, mapping failures into the error taxonomy
    async fn check_status(response: Response) -> ApiResult<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Authentication(format!("HTTP {}: {}", status, body)));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = retry_after_from_headers(&response).unwrap_or(DEFAULT_RETRY_AFTER);
            return Err(ApiError::RateLimited { retry_after });
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Transient(format!("HTTP {}: {}", status, body)))
    }
}

/// Extracts the provider-computed wait from a 429 response
///
/// Prefers a `retry-after` header (delay in seconds); falls back to
/// `x-rate-limit-reset` (epoch seconds at which the window reopens).
fn retry_after_from_headers(response: &Response) -> Option<Duration> {
    if let Some(value) = response.headers().get("retry-after") {
        let seconds: u64 = value.to_str().ok()?.trim().parse().ok()?;
        return Some(Duration::from_secs(seconds));
    }

    if let Some(value) = response.headers().get("x-rate-limit-reset") {
        let reset_epoch: i64 = value.to_str().ok()?.trim().parse().ok()?;
        let now_epoch = chrono::Utc::now().timestamp();
        let seconds = reset_epoch.saturating_sub(now_epoch).max(0) as u64;
        return Some(Duration::from_secs(seconds));
    }

    None
}

/// Maps a reqwest transport failure into the error taxonomy
fn classify_send_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Transient("request timeout".to_string())
    } else if error.is_connect() {
        ApiError::Transient(format!("connection failed: {}", error))
    } else {
        ApiError::Transient(error.to_string())
    }
}

#[async_trait]
impl Connection for HttpConnection {
    async fn search(&self, query: &SearchQuery, bounds: IdBounds) -> ApiResult<Vec<Post>> {
        let url = format!("{}/search/posts.json", self.base_url);

        let mut params: Vec<(&str, String)> = vec![
            ("q", query.query.clone()),
            ("count", query.count.to_string()),
        ];
        if let Some(result_type) = &query.result_type {
            params.push(("result_type", result_type.clone()));
        }
        if let Some(max_id) = bounds.max_id {
            params.push(("max_id", max_id.to_string()));
        }
        if let Some(since_id) = bounds.since_id {
            params.push(("since_id", since_id.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.credentials.bearer_token)
            .query(&params)
            .send()
            .await
            .map_err(classify_send_error)?;

        let response = Self::check_status(response).await?;

        let wire: WireSearchResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Transient(format!("malformed search response: {}", e)))?;

        let mut posts = Vec::with_capacity(wire.statuses.len());
        for status in wire.statuses {
            let post = status
                .into_post()
                .map_err(|e| ApiError::Transient(format!("malformed post timestamp: {}", e)))?;
            posts.push(post);
        }

        tracing::trace!("Search page for '{}': {} posts", query.query, posts.len());
        Ok(posts)
    }

    async fn fetch_neighbors(
        &self,
        account: &str,
        mode: NeighborMode,
        cursor: i64,
    ) -> ApiResult<NeighborPage> {
        let url = format!("{}/{}/ids.json", self.base_url, mode.as_str());

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.credentials.bearer_token)
            .query(&[
                ("screen_name", account.to_string()),
                ("cursor", cursor.to_string()),
            ])
            .send()
            .await
            .map_err(classify_send_error)?;

        let response = Self::check_status(response).await?;

        let page: NeighborPage = response
            .json()
            .await
            .map_err(|e| ApiError::Transient(format!("malformed neighbor response: {}", e)))?;

        tracing::trace!(
            "Neighbor page for '{}' ({}): {} ids, next_cursor={}",
            account,
            mode,
            page.ids.len(),
            page.next_cursor
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_credentials_load() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"bearer_token": "secret-token"}"#).unwrap();
        file.flush().unwrap();

        let credentials = Credentials::load(file.path()).unwrap();
        assert_eq!(credentials.bearer_token, "secret-token");
    }

    #[test]
    fn test_credentials_load_malformed() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"not json").unwrap();
        file.flush().unwrap();

        assert!(Credentials::load(file.path()).is_err());
    }

    #[test]
    fn test_new_strips_trailing_slash() {
        let credentials = Credentials {
            bearer_token: "t".to_string(),
        };
        let conn = HttpConnection::new("https://api.example.com/1.1/", credentials).unwrap();
        assert_eq!(conn.base_url, "https://api.example.com/1.1");
    }

    // Status mapping and wire parsing are exercised end-to-end against a
    // wiremock server in tests/http_api_tests.rs.
}
