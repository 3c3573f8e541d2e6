mod common;

use common::{config_for, mock_token, quiet_logger, TOKEN};
use futures::future::join_all;
use identitynow_mcp::errors::IdentityNowError;
use identitynow_mcp::services::api_client::ApiClient;
use identitynow_mcp::services::token_provider::{ClientCredentialsProvider, TokenProvider};
use mockito::Server;
use std::sync::Arc;

fn provider(server: &mockito::ServerGuard) -> ClientCredentialsProvider {
    let client = ApiClient::build_http_client().expect("http client");
    ClientCredentialsProvider::new(quiet_logger(), client, &config_for(server))
}

#[tokio::test]
async fn token_is_cached_until_expiry() {
    let mut server = Server::new_async().await;
    let mock = mock_token(&mut server, 3600, 1).await;

    let provider = provider(&server);
    let first = provider.token().await.expect("first token");
    let second = provider.token().await.expect("second token");

    assert_eq!(first.value, TOKEN);
    assert_eq!(first, second);
    assert_eq!(provider.exchange_count(), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn token_inside_expiry_skew_is_refreshed() {
    let mut server = Server::new_async().await;
    let mock = mock_token(&mut server, 60, 2).await;

    let provider = provider(&server);
    provider.token().await.expect("first token");
    provider.token().await.expect("second token");

    assert_eq!(provider.exchange_count(), 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn rejected_credentials_report_status() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/oauth/token")
        .with_status(401)
        .with_body(r#"{"error":"invalid_client"}"#)
        .expect(1)
        .create_async()
        .await;

    let err = provider(&server).token().await.expect_err("must fail");
    match &err {
        IdentityNowError::Authentication { status, status_text } => {
            assert_eq!(*status, Some(401));
            assert_eq!(status_text, "Unauthorized");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.to_string(), "Failed to authenticate: Unauthorized");
    mock.assert_async().await;
}

#[tokio::test]
async fn concurrent_callers_share_one_exchange() {
    let mut server = Server::new_async().await;
    let mock = mock_token(&mut server, 3600, 1).await;

    let provider = Arc::new(provider(&server));
    let tokens = join_all((0..8).map(|_| {
        let provider = provider.clone();
        async move { provider.token().await }
    }))
    .await;

    assert!(tokens.iter().all(|t| t.as_ref().map(|t| t.value == TOKEN).unwrap_or(false)));
    assert_eq!(provider.exchange_count(), 1);
    mock.assert_async().await;
}
