#![allow(dead_code)]

use identitynow_mcp::app::App;
use identitynow_mcp::config::Config;
use identitynow_mcp::services::api_client::RetryPolicy;
use identitynow_mcp::services::logger::{LogLevel, Logger};
use mockito::{Matcher, Mock, ServerGuard};

pub const TOKEN: &str = "tok-1";

pub fn config_for(server: &ServerGuard) -> Config {
    Config::new(
        Some(server.url()),
        Some("client-id".to_string()),
        Some("client-secret".to_string()),
    )
    .expect("test config")
}

pub fn quiet_logger() -> Logger {
    Logger::new("test").with_level(LogLevel::Error)
}

/// Retries without waiting, so failure paths stay fast.
pub fn fast_retry(max_attempts: usize) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay_ms: 1,
        max_delay_ms: 2,
        jitter: 0.0,
        ..RetryPolicy::default()
    }
}

pub async fn mock_token(server: &mut ServerGuard, expires_in: u64, hits: usize) -> Mock {
    server
        .mock("POST", "/oauth/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".to_string(), "client_credentials".to_string()),
            Matcher::UrlEncoded("client_id".to_string(), "client-id".to_string()),
            Matcher::UrlEncoded("client_secret".to_string(), "client-secret".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({ "access_token": TOKEN, "expires_in": expires_in }).to_string(),
        )
        .expect(hits)
        .create_async()
        .await
}

pub fn app_for(server: &ServerGuard) -> App {
    App::with_retry_policy(config_for(server), fast_retry(1)).expect("app")
}
