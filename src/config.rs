use crate::upstream::HttpUpstreamConfig;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

const ANALYTICS_KEY_SECRET: &str = "/run/secrets/analytics_api_key";
const DEFAULT_LOOKBACK_DAYS: i64 = 7;
const LOOKBACK_DAYS_RANGE: std::ops::RangeInclusive<i64> = 1..=365;

/// Configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub live_score_base_url: String,
    pub analytics_base_url: String,
    pub multi_division_base_url: String,
    /// Bearer token for the analytics provider. `None` means unauthenticated.
    pub analytics_api_key: Option<String>,
    pub http_port: u16,
    pub request_timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    pub upstream_requests_per_minute: u32,
    pub current_game_lookback_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok(), Path::new(ANALYTICS_KEY_SECRET))
    }

    /// Build from an arbitrary variable source. `secret_path` is consulted
    /// for the analytics key when the variable is absent.
    pub fn from_lookup<F>(var: F, secret_path: &Path) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Env var first, then the mounted secret file
        let analytics_api_key = match var("ANALYTICS_API_KEY") {
            Some(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
            Some(_) => return Err(anyhow!("ANALYTICS_API_KEY is set but empty")),
            None if secret_path.exists() => {
                let key = read_secret_file(secret_path, "analytics_api_key")?;
                if key.is_empty() {
                    return Err(anyhow!(
                        "Secret file at {} (analytics_api_key) is empty",
                        secret_path.display()
                    ));
                }
                Some(key)
            }
            None => {
                warn!("No analytics API key configured; analytics requests will be unauthenticated");
                None
            }
        };

        if let Some(key) = &analytics_api_key {
            let key_lower = key.to_lowercase();
            if key_lower.contains("change_me")
                || key_lower.contains("your_")
                || key_lower.starts_with("sample")
            {
                return Err(anyhow!(
                    "ANALYTICS_API_KEY appears to be a placeholder value; replace with your real key"
                ));
            }
        }

        let string_or = |name: &str, default: &str| {
            var(name)
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            live_score_base_url: string_or(
                "LIVE_SCORE_BASE_URL",
                "https://site.api.espn.com/apis/site/v2/sports",
            ),
            analytics_base_url: string_or("ANALYTICS_BASE_URL", "https://api.collegefootballdata.com"),
            multi_division_base_url: string_or("MULTI_DIVISION_BASE_URL", "https://ncaa-api.henrygd.me"),
            analytics_api_key,
            http_port: parse_or(&var, "HTTP_PORT", 8090),
            request_timeout_seconds: parse_or(&var, "REQUEST_TIMEOUT_SECONDS", 30),
            connect_timeout_seconds: parse_or(&var, "CONNECT_TIMEOUT_SECONDS", 10),
            upstream_requests_per_minute: parse_or(&var, "UPSTREAM_REQUESTS_PER_MINUTE", 60),
            current_game_lookback_days: lookback_days(&var),
        })
    }

    pub fn upstream(&self, base_url: &str, bearer_token: Option<String>) -> HttpUpstreamConfig {
        HttpUpstreamConfig {
            base_url: base_url.to_string(),
            bearer_token,
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
            connect_timeout: Duration::from_secs(self.connect_timeout_seconds),
            requests_per_minute: self.upstream_requests_per_minute,
        }
    }
}

fn lookback_days<F>(var: &F) -> i64
where
    F: Fn(&str) -> Option<String>,
{
    let days = parse_or(var, "CURRENT_GAME_LOOKBACK_DAYS", DEFAULT_LOOKBACK_DAYS);
    if LOOKBACK_DAYS_RANGE.contains(&days) {
        days
    } else {
        warn!(
            "CURRENT_GAME_LOOKBACK_DAYS={} outside {:?}; using {}",
            days, LOOKBACK_DAYS_RANGE, DEFAULT_LOOKBACK_DAYS
        );
        DEFAULT_LOOKBACK_DAYS
    }
}

fn parse_or<F, T>(var: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    var(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a secret from a mounted secret file
fn read_secret_file(file_path: &Path, secret_name: &str) -> Result<String> {
    std::fs::read_to_string(file_path)
        .map(|s| s.trim().to_string())
        .with_context(|| {
            format!(
                "Secret file at {} ({}) could not be read",
                file_path.display(),
                secret_name
            )
        })
}
