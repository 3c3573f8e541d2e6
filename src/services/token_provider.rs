use crate::config::Config;
use crate::constants::{endpoints, network, token as token_constants};
use crate::errors::IdentityNowError;
use crate::services::logger::Logger;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub expires_at: Instant,
}

impl Token {
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a bearer token that is not known to be expired.
    async fn token(&self) -> Result<Token, IdentityNowError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// OAuth2 client-credentials grant against `{base_url}/oauth/token`.
///
/// The state mutex is held across the exchange, so callers racing past an
/// expired token wait for a single refresh instead of each starting one.
pub struct ClientCredentialsProvider {
    logger: Logger,
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    timeout_ms: u64,
    state: Mutex<Option<Token>>,
    exchanges: AtomicU64,
}

impl ClientCredentialsProvider {
    pub fn new(logger: Logger, client: Client, config: &Config) -> Self {
        Self {
            logger: logger.child("token"),
            client,
            token_url: config.url(endpoints::TOKEN),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            timeout_ms: network::TIMEOUT_TOKEN_REQUEST_MS.min(config.timeout_ms),
            state: Mutex::new(None),
            exchanges: AtomicU64::new(0),
        }
    }

    /// Number of credential exchanges performed so far.
    pub fn exchange_count(&self) -> u64 {
        self.exchanges.load(Ordering::SeqCst)
    }

    async fn exchange(&self) -> Result<Token, IdentityNowError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        let form = [
            ("grant_type", token_constants::GRANT_TYPE),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let request = self
            .client
            .post(&self.token_url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .form(&form);

        let response = tokio::time::timeout(Duration::from_millis(self.timeout_ms), request.send())
            .await
            .map_err(|_| IdentityNowError::Timeout(self.timeout_ms))?
            .map_err(|err| IdentityNowError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let status_text = status
                .canonical_reason()
                .map(|s| s.to_string())
                .unwrap_or_else(|| status.as_u16().to_string());
            self.logger.error(
                "token exchange rejected",
                Some(&serde_json::json!({ "status": status.as_u16() })),
            );
            return Err(IdentityNowError::Authentication {
                status: Some(status.as_u16()),
                status_text,
            });
        }

        let payload: TokenResponse = response.json().await.map_err(|err| IdentityNowError::Decode {
            path: endpoints::TOKEN.to_string(),
            message: err.to_string(),
        })?;
        if payload.access_token.trim().is_empty() {
            return Err(IdentityNowError::Authentication {
                status: Some(status.as_u16()),
                status_text: "token response did not include access_token".to_string(),
            });
        }

        let lifetime = payload
            .expires_in
            .unwrap_or(0)
            .saturating_sub(token_constants::EXPIRY_SKEW_SECS);
        self.logger.debug(
            "token refreshed",
            Some(&serde_json::json!({
                "expires_in": payload.expires_in,
                "cached_for_secs": lifetime,
            })),
        );
        Ok(Token {
            value: payload.access_token,
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        })
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    async fn token(&self) -> Result<Token, IdentityNowError> {
        let mut guard = self.state.lock().await;
        if let Some(current) = guard.as_ref() {
            if current.is_valid_at(Instant::now()) {
                return Ok(current.clone());
            }
        }
        let fresh = self.exchange().await?;
        *guard = Some(fresh.clone());
        Ok(fresh)
    }
}
