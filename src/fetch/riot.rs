//! Riot API client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::{retry, Account, FetchError, LeagueEntry, MasteryEntry, RankLookup, RetryPolicy};
use crate::config::RiotConfig;

const API_KEY_HEADER: &str = "x-riot-token";

/// HTTP implementation of [`RankLookup`].
pub struct RiotClient {
    client: Client,
    account_base_url: Url,
    platform_base_url: Url,
    policy: RetryPolicy,
}

impl RiotClient {
    pub fn new(config: &RiotConfig, api_key: &str) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("elo-snitch/", env!("CARGO_PKG_VERSION"))),
        );
        let mut key = HeaderValue::from_str(api_key).map_err(|_| FetchError::InvalidApiKey)?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            account_base_url: parse_base(&config.account_base_url)?,
            platform_base_url: parse_base(&config.platform_base_url)?,
            policy: config.retry_policy(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        debug!("GET {}", url.path());
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(self.policy.rate_limit_wait.as_secs());

            return Err(FetchError::RateLimited {
                host: url.host_str().unwrap_or("unknown").to_string(),
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

fn parse_base(raw: &str) -> Result<Url, FetchError> {
    Url::parse(raw).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))
}

/// Append percent-encoded path segments to a base URL.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, FetchError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| FetchError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[async_trait]
impl RankLookup for RiotClient {
    fn name(&self) -> &'static str {
        "riot"
    }

    async fn resolve_account(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> Result<Account, FetchError> {
        let url = endpoint(
            &self.account_base_url,
            &["riot", "account", "v1", "accounts", "by-riot-id", game_name, tag_line],
        )?;
        let label = format!("account {}#{}", game_name, tag_line);
        let account: Account = retry(&self.policy, &label, || self.get_json(&url)).await?;
        info!("Resolved {}#{}", game_name, tag_line);
        Ok(account)
    }

    async fn league_entries(&self, puuid: &str) -> Result<Vec<LeagueEntry>, FetchError> {
        let url = endpoint(
            &self.platform_base_url,
            &["lol", "league", "v4", "entries", "by-puuid", puuid],
        )?;
        retry(&self.policy, "league entries", || self.get_json(&url)).await
    }

    async fn top_masteries(
        &self,
        puuid: &str,
        count: u32,
    ) -> Result<Vec<MasteryEntry>, FetchError> {
        let url = mastery_url(&self.platform_base_url, puuid, count)?;
        retry(&self.policy, "champion masteries", || self.get_json(&url)).await
    }
}

fn mastery_url(base: &Url, puuid: &str, count: u32) -> Result<Url, FetchError> {
    let mut url = endpoint(
        base,
        &["lol", "champion-mastery", "v4", "champion-masteries", "by-puuid", puuid, "top"],
    )?;
    url.query_pairs_mut().append_pair("count", &count.to_string());
    Ok(url)
}
