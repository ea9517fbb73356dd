//! Authenticated, rate-limit aware calls to the Web API.
//!
//! Every outbound API request goes through [`Fetcher::call`]. The caller
//! picks a [`RetryPolicy`]: [`RetryPolicy::PATIENT`] for user-triggered
//! mutations, [`RetryPolicy::FAST`] for polling reads that have a cache to
//! fall back on.

use crate::error::{Result, SpotifyError};
use crate::token::TokenManager;
use crate::types::SpotifyConfig;
use curator_core::UserId;
use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_RETRY_AFTER_SECS: u64 = 1;
const MAX_JITTER_MS: u64 = 250;

/// How long a call may keep retrying after `429 Too Many Requests`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Ceiling on the sum of all backoff sleeps
    pub max_total_wait: Duration,
    /// Ceiling on a single backoff sleep
    pub max_wait_per_attempt: Duration,
}

impl RetryPolicy {
    /// Bounded retries for user-triggered actions.
    pub const PATIENT: Self = Self {
        max_retries: 2,
        max_total_wait: Duration::from_millis(8_000),
        max_wait_per_attempt: Duration::from_secs(30),
    };

    /// Fail on the first 429.
    pub const FAST: Self = Self {
        max_retries: 0,
        max_total_wait: Duration::ZERO,
        max_wait_per_attempt: Duration::ZERO,
    };
}

/// Backoff before retry number `retries_done + 1`, or `None` when the
/// policy is spent.
pub fn next_wait(
    policy: &RetryPolicy,
    retries_done: u32,
    waited: Duration,
    retry_after_secs: Option<u64>,
    jitter: Duration,
) -> Option<Duration> {
    if retries_done >= policy.max_retries {
        return None;
    }

    let remaining = policy.max_total_wait.saturating_sub(waited);
    if remaining.is_zero() {
        return None;
    }

    let suggested =
        Duration::from_secs(retry_after_secs.unwrap_or(DEFAULT_RETRY_AFTER_SECS)) + jitter;
    Some(suggested.min(policy.max_wait_per_attempt).min(remaining))
}

fn jitter() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(0..MAX_JITTER_MS))
}

fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    let secs: f64 = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then(|| secs.ceil() as u64)
}

/// A single Web API request. `path` is relative to the API base URL and
/// includes any query string.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Issues API calls with bearer auth, one forced refresh on 401, and
/// policy-bounded backoff on 429.
#[derive(Clone)]
pub struct Fetcher {
    http: Client,
    config: Arc<SpotifyConfig>,
    tokens: TokenManager,
}

impl Fetcher {
    pub fn new(http: Client, config: Arc<SpotifyConfig>, tokens: TokenManager) -> Self {
        Self {
            http,
            config,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Perform `request` for `user_id`.
    ///
    /// Returns `Ok(None)` for `204 No Content` or an empty 2xx body.
    pub async fn call(
        &self,
        user_id: UserId,
        request: &ApiRequest,
        policy: RetryPolicy,
    ) -> Result<Option<Value>> {
        let mut token = self
            .tokens
            .get_valid_access_token(user_id)
            .await?
            .ok_or(SpotifyError::NoAccessToken)?;

        let url = format!("{}{}", self.config.api_base_url, request.path);
        let mut forced_refresh = false;
        let mut retries = 0;
        let mut waited = Duration::ZERO;

        loop {
            debug!(user_id = %user_id, method = %request.method, endpoint = %request.path, attempt = retries + 1, "Calling Spotify API");

            let mut builder = self
                .http
                .request(request.method.clone(), &url)
                .bearer_auth(&token);
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }
            let response = builder.send().await?;
            let status = response.status();

            if status == StatusCode::NO_CONTENT {
                return Ok(None);
            }

            if status == StatusCode::UNAUTHORIZED {
                if forced_refresh {
                    return Err(SpotifyError::AuthRejected);
                }
                forced_refresh = true;
                token = self
                    .tokens
                    .force_refresh(user_id)
                    .await?
                    .ok_or(SpotifyError::AuthRejected)?;
                continue;
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = parse_retry_after(response.headers());
                if let Some(wait) = next_wait(&policy, retries, waited, retry_after, jitter()) {
                    warn!(
                        user_id = %user_id,
                        endpoint = %request.path,
                        attempt = retries + 1,
                        wait_ms = wait.as_millis() as u64,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(wait).await;
                    retries += 1;
                    waited += wait;
                    continue;
                }

                let body = response.text().await.unwrap_or_default();
                return Err(SpotifyError::RateLimited {
                    retry_after_secs: retry_after,
                    body,
                });
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                debug!(endpoint = %request.path, status = status.as_u16(), "Spotify API call failed");
                return Err(SpotifyError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            let bytes = response.bytes().await?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(None);
            }
            return serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| SpotifyError::Parse(e.to_string()));
        }
    }

    /// [`Fetcher::call`] followed by deserialization into `T`.
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        user_id: UserId,
        request: &ApiRequest,
        policy: RetryPolicy,
    ) -> Result<Option<T>> {
        self.call(user_id, request, policy)
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| SpotifyError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_policy_never_waits() {
        assert_eq!(
            next_wait(&RetryPolicy::FAST, 0, Duration::ZERO, Some(1), Duration::ZERO),
            None
        );
    }

    #[test]
    fn test_patient_policy_respects_total_budget() {
        let policy = RetryPolicy::PATIENT;

        let first = next_wait(&policy, 0, Duration::ZERO, Some(5), Duration::ZERO).unwrap();
        assert_eq!(first, Duration::from_secs(5));

        let second = next_wait(&policy, 1, first, Some(5), Duration::ZERO).unwrap();
        assert_eq!(second, Duration::from_secs(3));

        assert_eq!(next_wait(&policy, 2, first + second, Some(5), Duration::ZERO), None);
        assert!(first + second <= policy.max_total_wait);
    }

    #[test]
    fn test_budget_exhausted_before_retries() {
        let policy = RetryPolicy::PATIENT;
        assert_eq!(
            next_wait(&policy, 1, Duration::from_secs(8), Some(1), Duration::ZERO),
            None
        );
    }

    #[test]
    fn test_missing_retry_after_defaults_to_one_second_plus_jitter() {
        let wait = next_wait(
            &RetryPolicy::PATIENT,
            0,
            Duration::ZERO,
            None,
            Duration::from_millis(120),
        )
        .unwrap();
        assert_eq!(wait, Duration::from_millis(1_120));
    }

    #[test]
    fn test_per_attempt_cap() {
        let policy = RetryPolicy {
            max_retries: 5,
            max_total_wait: Duration::from_secs(600),
            max_wait_per_attempt: Duration::from_secs(30),
        };
        let wait = next_wait(&policy, 0, Duration::ZERO, Some(120), Duration::ZERO).unwrap();
        assert_eq!(wait, Duration::from_secs(30));
    }

    #[test]
    fn test_jitter_stays_small() {
        for _ in 0..100 {
            assert!(jitter() < Duration::from_millis(MAX_JITTER_MS));
        }
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, "4".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(4));

        headers.insert(RETRY_AFTER, "-1".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, "soon".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), None);
    }
}
