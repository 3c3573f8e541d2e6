mod common;

use async_trait::async_trait;
use common::{config_for, fast_retry, mock_token, quiet_logger, TOKEN};
use identitynow_mcp::config::Config;
use identitynow_mcp::errors::IdentityNowError;
use identitynow_mcp::services::api_client::{ApiClient, RetryPolicy};
use identitynow_mcp::services::token_provider::{ClientCredentialsProvider, Token, TokenProvider};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

fn api(server: &ServerGuard, max_attempts: usize) -> ApiClient {
    let config = config_for(server);
    let client = ApiClient::build_http_client().expect("http client");
    let tokens: Arc<dyn TokenProvider> = Arc::new(ClientCredentialsProvider::new(
        quiet_logger(),
        client.clone(),
        &config,
    ));
    ApiClient::new(quiet_logger(), client, &config, tokens).with_retry_policy(fast_retry(max_attempts))
}

#[tokio::test]
async fn attaches_bearer_token_and_decodes_json() {
    let mut server = Server::new_async().await;
    let token = mock_token(&mut server, 3600, 1).await;
    let mock = server
        .mock("GET", "/v2025/thing")
        .match_header("authorization", "Bearer tok-1")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"a":1}"#)
        .expect(2)
        .create_async()
        .await;

    let api = api(&server, 1);
    let first: Value = api.get("/v2025/thing").await.expect("first call");
    let second: Value = api.get("/v2025/thing").await.expect("second call");

    assert_eq!(first, json!({ "a": 1 }));
    assert_eq!(first, second);
    token.assert_async().await;
    mock.assert_async().await;
}

#[tokio::test]
async fn posts_json_bodies() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 3600, 1).await;
    let mock = server
        .mock("POST", "/v2025/search")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({ "indices": ["identities"] })))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let out: Vec<Value> = api(&server, 1)
        .post("/v2025/search", &json!({ "indices": ["identities"] }))
        .await
        .expect("search");
    assert!(out.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 3600, 1).await;
    let mock = server
        .mock("GET", "/v2025/identities/x")
        .with_status(401)
        .with_body(r#"{"error":"bad token"}"#)
        .expect(1)
        .create_async()
        .await;

    let err = api(&server, 3)
        .get::<Value>("/v2025/identities/x")
        .await
        .expect_err("must fail");
    match &err {
        IdentityNowError::Api { status, status_text, body, .. } => {
            assert_eq!(*status, 401);
            assert_eq!(status_text, "Unauthorized");
            assert!(body.contains("bad token"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn service_unavailable_is_retried_up_to_the_limit() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 3600, 1).await;
    let mock = server
        .mock("GET", "/v2025/roles")
        .with_status(503)
        .expect(2)
        .create_async()
        .await;

    let err = api(&server, 2)
        .get::<Value>("/v2025/roles")
        .await
        .expect_err("must fail");
    assert_eq!(err.status(), Some(503));
    mock.assert_async().await;
}

#[tokio::test]
async fn empty_success_body_decodes_as_null() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 3600, 1).await;
    let _empty = server
        .mock("GET", "/v2025/empty")
        .with_status(204)
        .create_async()
        .await;

    let out: Value = api(&server, 1).get("/v2025/empty").await.expect("empty");
    assert!(out.is_null());
}

#[tokio::test]
async fn failed_token_exchange_stops_the_request() {
    let mut server = Server::new_async().await;
    let _token = server
        .mock("POST", "/oauth/token")
        .with_status(400)
        .create_async()
        .await;
    let mock = server
        .mock("GET", "/v2025/roles")
        .expect(0)
        .create_async()
        .await;

    let err = api(&server, 1)
        .get::<Value>("/v2025/roles")
        .await
        .expect_err("must fail");
    assert!(matches!(err, IdentityNowError::Authentication { status: Some(400), .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn throttled_requests_wait_for_retry_after() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 3600, 1).await;
    let mock = server
        .mock("GET", "/v2025/roles")
        .with_status(429)
        .with_header("retry-after", "2")
        .expect(2)
        .create_async()
        .await;

    let policy = RetryPolicy {
        max_attempts: 2,
        base_delay_ms: 1,
        max_delay_ms: 300,
        jitter: 0.0,
        ..RetryPolicy::default()
    };
    let api = api(&server, 1).with_retry_policy(policy);
    let started = Instant::now();
    let err = api.get::<Value>("/v2025/roles").await.expect_err("must fail");

    assert!(started.elapsed() >= Duration::from_millis(300));
    match &err {
        IdentityNowError::Api { status, retry_after_ms, .. } => {
            assert_eq!(*status, 429);
            assert_eq!(*retry_after_ms, Some(2_000));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    mock.assert_async().await;
}

struct StaticToken;

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<Token, IdentityNowError> {
        Ok(Token {
            value: TOKEN.to_string(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        })
    }
}

#[tokio::test]
async fn unanswered_requests_time_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let silent = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let config = Config::new(
        Some(format!("http://{}", addr)),
        Some("client-id".to_string()),
        Some("client-secret".to_string()),
    )
    .expect("config")
    .with_timeout_ms(50);
    let client = ApiClient::build_http_client().expect("http client");
    let api = ApiClient::new(quiet_logger(), client, &config, Arc::new(StaticToken))
        .with_retry_policy(fast_retry(2));

    let err = api.get::<Value>("/v2025/roles").await.expect_err("must time out");
    assert!(matches!(err, IdentityNowError::Timeout(50)), "{:?}", err);
    assert_eq!(err.to_string(), "SailPoint request timed out after 50 ms");
    silent.abort();
}
