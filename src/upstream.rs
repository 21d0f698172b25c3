//! Upstream client: one GET against one provider endpoint.
//!
//! No retry and no caching happen here. A non-2xx status, a network failure
//! or a body that is not JSON all come back as [`UpstreamError`].

use crate::error::UpstreamError;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, info};

/// Path and query string for a single provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    /// Path relative to the provider's base URL, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl UpstreamRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn param_opt(self, name: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.param(name, v),
            None => self,
        }
    }
}

#[async_trait]
pub trait Upstream: Send + Sync {
    async fn get_json(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError>;
}

#[derive(Debug, Clone)]
pub struct HttpUpstreamConfig {
    pub base_url: String,
    pub bearer_token: Option<String>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub requests_per_minute: u32,
}

/// reqwest-backed upstream with a client-side rate limit.
pub struct HttpUpstream {
    name: &'static str,
    base_url: String,
    bearer_token: Option<String>,
    http_client: reqwest::Client,
    rate_limiter: DefaultDirectRateLimiter,
}

impl HttpUpstream {
    pub fn new(name: &'static str, config: HttpUpstreamConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(5)
            .user_agent(concat!("sports-aggregator/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let per_minute = NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        info!(
            "{} upstream at {} ({} requests/minute)",
            name, config.base_url, per_minute
        );

        Ok(Self {
            name,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bearer_token: config.bearer_token,
            http_client,
            rate_limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
        })
    }

    fn url_for(&self, request: &UpstreamRequest) -> String {
        format!("{}{}", self.base_url, request.path)
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn get_json(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        // Wait for rate limit
        self.rate_limiter.until_ready().await;

        let url = self.url_for(request);
        debug!(provider = self.name, %url, "upstream GET");

        let mut builder = self.http_client.get(&url).query(&request.query);
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|source| UpstreamError::Network {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| UpstreamError::Network {
                url: url.clone(),
                source,
            })?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                url,
                status: status.as_u16(),
                body: truncate(&body, 512),
            });
        }

        serde_json::from_str(&body).map_err(|source| UpstreamError::Body { url, source })
    }
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder_skips_absent_params() {
        let request = UpstreamRequest::new("/records")
            .param("year", 2024)
            .param_opt("team", Some("Texas"))
            .param_opt("conference", None::<&str>);
        assert_eq!(request.path, "/records");
        assert_eq!(
            request.query,
            vec![
                ("year".to_string(), "2024".to_string()),
                ("team".to_string(), "Texas".to_string())
            ]
        );
    }

    #[test]
    fn test_truncate_long_bodies() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
