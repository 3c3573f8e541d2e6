use crate::config::Config;
use crate::constants::{limits, network, retry as retry_constants};
use crate::errors::IdentityNowError;
use crate::services::logger::Logger;
use crate::services::token_provider::TokenProvider;
use crate::utils::redact::redact_text;
use rand::Rng;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: f64,
    pub status_codes: Vec<u16>,
    pub respect_retry_after: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry_constants::MAX_ATTEMPTS,
            base_delay_ms: retry_constants::BASE_DELAY_MS,
            max_delay_ms: retry_constants::MAX_DELAY_MS,
            jitter: retry_constants::JITTER,
            status_codes: retry_constants::STATUS_CODES.to_vec(),
            respect_retry_after: true,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            ..Self::default()
        }
    }

    fn should_retry(&self, err: &IdentityNowError) -> bool {
        match err {
            IdentityNowError::Api { status, .. } => self.status_codes.contains(status),
            other => other.is_transient(),
        }
    }

    fn delay_for(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as u32;
        let raw = self
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);
        if self.jitter <= 0.0 || raw == 0 {
            return Duration::from_millis(raw);
        }
        let spread = (raw as f64 * self.jitter).max(1.0);
        let offset = rand::thread_rng().gen_range(-spread..=spread);
        Duration::from_millis((raw as f64 + offset).max(0.0) as u64)
    }

    /// Backoff for the next attempt, stretched to the upstream `Retry-After`
    /// when one was sent. Never longer than `max_delay_ms`.
    fn delay_after(&self, attempt: usize, err: &IdentityNowError) -> Duration {
        let backoff = self.delay_for(attempt);
        if !self.respect_retry_after {
            return backoff;
        }
        match err {
            IdentityNowError::Api {
                retry_after_ms: Some(ms),
                ..
            } => backoff.max(Duration::from_millis((*ms).min(self.max_delay_ms))),
            _ => backoff,
        }
    }
}

/// Parses `Retry-After` as delta-seconds or an HTTP date.
fn parse_retry_after(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(secs.saturating_mul(1_000));
    }
    let at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    let wait = at.signed_duration_since(Utc::now()).num_milliseconds();
    Some(wait.max(0) as u64)
}

/// Authenticated JSON dispatcher for the tenant API.
pub struct ApiClient {
    logger: Logger,
    client: Client,
    config: Config,
    tokens: Arc<dyn TokenProvider>,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn build_http_client() -> Result<Client, IdentityNowError> {
        Client::builder()
            .user_agent(network::USER_AGENT)
            .build()
            .map_err(|err| IdentityNowError::Config(format!("Failed to build HTTP client: {}", err)))
    }

    pub fn new(
        logger: Logger,
        client: Client,
        config: &Config,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            logger: logger.child("api"),
            client,
            config: config.clone(),
            tokens,
            retry: RetryPolicy::from_config(config),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, IdentityNowError> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, IdentityNowError> {
        self.send(Method::POST, path, Some(body)).await
    }

    /// Issues one logical request, retrying transport failures and transient
    /// statuses, then decodes the JSON body into `T`.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, IdentityNowError> {
        let url = self.config.url(path);
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0usize;

        let value = loop {
            attempt += 1;
            match self.send_once(method.clone(), &url, body).await {
                Ok(value) => break value,
                Err(err) => {
                    if attempt >= max_attempts || !self.retry.should_retry(&err) {
                        self.logger.warn(
                            "request failed",
                            Some(&serde_json::json!({
                                "method": method.as_str(),
                                "path": path,
                                "attempt": attempt,
                                "status": err.status(),
                            })),
                        );
                        return Err(err);
                    }
                    let delay = self.retry.delay_after(attempt, &err);
                    self.logger.debug(
                        "retrying request",
                        Some(&serde_json::json!({
                            "method": method.as_str(),
                            "path": path,
                            "attempt": attempt,
                            "delay_ms": delay.as_millis() as u64,
                        })),
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        };

        serde_json::from_value::<T>(value).map_err(|err| IdentityNowError::Decode {
            path: path.to_string(),
            message: err.to_string(),
        })
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Value, IdentityNowError> {
        let token = self.tokens.token().await?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token.value)).map_err(|_| {
            IdentityNowError::Authentication {
                status: None,
                status_text: "token contains characters not allowed in a header".to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, bearer);

        let mut request = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let timeout_ms = self.config.timeout_ms;
        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|err| IdentityNowError::Transport(err.to_string()))?;
            let status = response.status();
            let retry_after_ms = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(parse_retry_after);
            let text = response
                .text()
                .await
                .map_err(|err| IdentityNowError::Transport(err.to_string()))?;
            Ok::<_, IdentityNowError>((status, retry_after_ms, text))
        };
        let (status, retry_after_ms, text) =
            tokio::time::timeout(Duration::from_millis(timeout_ms), exchange)
                .await
                .map_err(|_| IdentityNowError::Timeout(timeout_ms))??;

        if !status.is_success() {
            return Err(IdentityNowError::Api {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
                body: redact_text(&text, limits::LOG_BODY_LENGTH),
                retry_after_ms,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|err| IdentityNowError::Decode {
            path: url.trim_start_matches(self.config.base_url.as_str()).to_string(),
            message: err.to_string(),
        })
    }
}
