use crate::config::FetchConfig;
use crate::error::{Result, ScreenerError};
use crate::retry::RetryPolicy;
use chrono::Utc;
use log::{debug, warn};
use regex::Regex;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
/// Slack added on top of an IP ban deadline before asking again.
const BAN_GRACE: Duration = Duration::from_secs(5);

static BAN_UNTIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"until\s+(\d+)").expect("ban deadline pattern is valid"));

/// Public market-data client for the Binance spot REST API.
#[derive(Debug, Clone)]
pub struct BinanceClient {
    http: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl BinanceClient {
    pub fn new(base_url: &str, retry: RetryPolicy) -> Result<Self> {
        let http = Client::builder()
            .pool_max_idle_per_host(50)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        Self::new(&config.base_url, config.retry.clone())
    }

    /// GET `path` and decode the JSON body, retrying transient failures per the policy.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        self.retry.run(|| self.get_once(&url, query)).await
    }

    async fn get_once<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        debug!("GET {} {:?}", url, query);
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();

        if status == StatusCode::IM_A_TEAPOT || status == StatusCode::TOO_MANY_REQUESTS {
            let header_wait = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let text = response.text().await.unwrap_or_default();
            let wait = ban_wait(&text, Utc::now().timestamp_millis()).or(header_wait);
            warn!("rate limited by exchange (status {}), wait {:?}", status.as_u16(), wait);
            return Err(ScreenerError::RateLimited(wait));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScreenerError::Status { status: status.as_u16(), body });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ScreenerError::Decode(format!("{}: {}", url, e)))
    }
}

/// Time left on an IP ban (`-1003 ... until <ms>`), plus a grace period.
fn ban_wait(body: &str, now_ms: i64) -> Option<Duration> {
    if !body.contains("-1003") {
        return None;
    }
    let ban_until: i64 = BAN_UNTIL.captures(body)?.get(1)?.as_str().parse().ok()?;
    if ban_until <= now_ms {
        return None;
    }
    Some(Duration::from_millis((ban_until - now_ms) as u64) + BAN_GRACE)
}
