//! Stats API client
//!
//! Two read-only endpoints are queried per username:
//! - `{base}/{username}/solved` for per-difficulty counts
//! - `{base}/languageStats?username={username}` for per-language counts
//!
//! Each query goes through [`retry_with_backoff`]; when every attempt fails the result is
//! [`FetchResult::Absent`] rather than an error.

use crate::config::{ApiConfig, RetryConfig};
use crate::error::{Error, FetchError, Result};
use crate::retry::retry_with_backoff;
use crate::types::FetchResult;
use async_trait::async_trait;
use url::Url;

/// Source of per-user statistics
///
/// `Ok(FetchResult::Absent)` means the data could not be obtained and the user should get
/// default records. `Err` is reserved for failures outside the retry policy and aborts only
/// the current user.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Per-difficulty attempted/accepted counts for `username`
    async fn solved(&self, username: &str) -> Result<FetchResult>;

    /// Per-language solved counts for `username`
    async fn language_stats(&self, username: &str) -> Result<FetchResult>;
}

/// HTTP client for the stats API
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    api: ApiConfig,
    retry: RetryConfig,
}

impl ApiClient {
    /// Create a client for the configured base URL
    pub fn new(api: ApiConfig, retry: RetryConfig) -> Result<Self> {
        let base = Url::parse(api.base_url.trim()).map_err(|e| {
            Error::config("api.base_url", format!("invalid base URL {:?}: {}", api.base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(Error::config(
                "api.base_url",
                format!("{} cannot be used as a base URL", base),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(api.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base,
            api,
            retry,
        })
    }

    /// URL of the solved-counts endpoint for `username`
    pub fn solved_url(&self, username: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| invalid_url(username, "base URL cannot have path segments"))?
            .pop_if_empty()
            .push(username)
            .push("solved");
        Ok(url)
    }

    /// URL of the language-stats endpoint for `username`
    pub fn language_stats_url(&self, username: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| invalid_url(username, "base URL cannot have path segments"))?
            .pop_if_empty()
            .push("languageStats");
        url.query_pairs_mut().append_pair("username", username);
        Ok(url)
    }

    /// GET `url` with retries, degrading to [`FetchResult::Absent`] when every attempt fails
    pub async fn fetch(&self, url: &Url) -> FetchResult {
        match retry_with_backoff(&self.retry, move || self.get_json(url)).await {
            Ok(value) => FetchResult::Payload(value),
            Err(e) => {
                tracing::error!(url = %url, error = %e, "giving up on request");
                FetchResult::Absent
            }
        }
    }

    /// One attempt: GET, require 2xx, decode JSON
    async fn get_json(&self, url: &Url) -> std::result::Result<serde_json::Value, FetchError> {
        let response = self
            .http
            .get(url.clone())
            .timeout(self.api.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

fn invalid_url(user: &str, reason: &str) -> Error {
    Error::InvalidUrl {
        user: user.to_string(),
        reason: reason.to_string(),
    }
}

#[async_trait]
impl StatsSource for ApiClient {
    async fn solved(&self, username: &str) -> Result<FetchResult> {
        let url = self.solved_url(username)?;
        Ok(self.fetch(&url).await)
    }

    async fn language_stats(&self, username: &str) -> Result<FetchResult> {
        let url = self.language_stats_url(username)?;
        Ok(self.fetch(&url).await)
    }
}
