mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use common::*;
use fxiaoke_broker::{
	api::TOKEN_ENDPOINT,
	auth::{CredentialSnapshot, Identity},
	config::ClientConfig,
	error::{ConfigError, Error},
};

#[tokio::test]
async fn force_refresh_swaps_token() {
	let server = MockServer::start_async().await;
	let mut first = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_ENDPOINT);
			then.status(200).json_body(token_response("token-1", json!(7200)));
		})
		.await;
	let client = client(config(&server));
	let manager = client.credentials();

	assert_eq!(
		manager.acquire().await.expect("Initial acquire should succeed.").token.expose(),
		"token-1"
	);

	first.delete_async().await;

	let second = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_ENDPOINT);
			then.status(200).json_body(token_response("token-2", json!(7200)));
		})
		.await;
	let refreshed = manager.force_refresh().await.expect("Forced refresh should succeed.");

	assert_eq!(refreshed.token.expose(), "token-2");
	assert_eq!(
		manager.current_snapshot().token.as_ref().map(|token| token.expose()),
		Some("token-2")
	);

	second.assert_calls_async(1).await;
}

#[tokio::test]
async fn failed_force_refresh_leaves_cache_empty() {
	let server = MockServer::start_async().await;
	let mut ok = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_ENDPOINT);
			then.status(200).json_body(token_response("token-1", json!(7200)));
		})
		.await;
	let client = client(config(&server));
	let manager = client.credentials();

	manager.acquire().await.expect("Initial acquire should succeed.");
	ok.delete_async().await;
	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_ENDPOINT);
			then.status(200).json_body(json!({ "errorCode": 10001, "errorMessage": "busy" }));
		})
		.await;
	manager.force_refresh().await.expect_err("Business failures must fail the refresh.");

	assert_eq!(manager.current_snapshot(), CredentialSnapshot::empty());
	assert_eq!(manager.metrics().failures(), 1);
}

#[tokio::test]
async fn missing_identity_never_reaches_the_provider() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_ENDPOINT);
			then.status(200).json_body(token_response("token-1", json!(7200)));
		})
		.await;
	let config = ClientConfig { identity: Identity::default(), ..config(&server) };
	let client = client(config);
	let err = client.credentials().acquire().await.expect_err("Missing identity must fail.");

	assert!(matches!(err, Error::Config(ConfigError::MissingIdentity { name: "appId" })));

	token.assert_calls_async(0).await;
}

#[tokio::test]
async fn shutdown_disarms_scheduled_refresh() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_ENDPOINT);
			then.status(200).json_body(token_response("token-1", json!(7200)));
		})
		.await;

	let client = client(config(&server));

	client.credentials().acquire().await.expect("Acquire should succeed.");

	assert!(client.credentials().is_timer_armed());

	client.shutdown();

	assert!(!client.credentials().is_timer_armed());
	assert!(!client.credentials().is_valid());
}
