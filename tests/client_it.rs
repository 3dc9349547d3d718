mod common;

// crates.io
use httpmock::prelude::*;
use serde::Deserialize;
use serde_json::json;
// self
use common::*;
use fxiaoke_broker::{
	api::TOKEN_ENDPOINT,
	error::{ApplicationError, Error, TransientError},
};

const QUERY_ENDPOINT: &str = "/cgi/crm/v2/data/query";

#[tokio::test]
async fn request_fetches_token_once_and_injects_credentials() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_ENDPOINT).json_body(token_request());
			then.status(200)
				.header("content-type", "application/json")
				.json_body(token_response("corp-token", json!(7200)));
		})
		.await;
	let query = server
		.mock_async(|when, then| {
			when.method(POST).path(QUERY_ENDPOINT).json_body(json!({
				"currentOpenUserId": "FSUID_1",
				"corpAccessToken": "corp-token",
				"corpId": CORP_ID,
			}));
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "errorCode": 0, "traceId": "E-1", "total": 2 }));
		})
		.await;
	let client = client(config(&server));

	for _ in 0..2 {
		let payload = client
			.request(QUERY_ENDPOINT, json!({ "currentOpenUserId": "FSUID_1" }))
			.await
			.expect("Business request should succeed.");

		assert_eq!(payload.get("total"), Some(&json!(2)));
		assert_eq!(payload.trace_id.as_deref(), Some("E-1"));
	}

	token.assert_calls_async(1).await;
	query.assert_calls_async(2).await;
}

#[tokio::test]
async fn request_as_decodes_typed_reply() {
	#[derive(Debug, Deserialize)]
	#[serde(rename_all = "camelCase")]
	struct UserReply {
		emp_list: Vec<Employee>,
	}
	#[derive(Debug, Deserialize)]
	#[serde(rename_all = "camelCase")]
	struct Employee {
		open_user_id: String,
	}

	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_ENDPOINT);
			then.status(200).json_body(token_response("corp-token", json!("7200")));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/cgi/user/getByMobile");
			then.status(200)
				.json_body(json!({ "errorCode": 0, "empList": [{ "openUserId": "FSUID_9" }] }));
		})
		.await;

	let client = client(config(&server));
	let reply: UserReply = client
		.request_as("/cgi/user/getByMobile", json!({ "mobile": "13800000000" }))
		.await
		.expect("Typed request should decode.");

	assert_eq!(reply.emp_list[0].open_user_id, "FSUID_9");
	assert_eq!(client.credentials().current_snapshot().ttl_seconds, Some(7200));
}

#[tokio::test]
async fn business_error_code_is_retried_then_surfaced() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_ENDPOINT);
			then.status(200).json_body(token_response("corp-token", json!(7200)));
		})
		.await;

	let query = server
		.mock_async(|when, then| {
			when.method(POST).path(QUERY_ENDPOINT);
			then.status(200).json_body(json!({
				"errorCode": 20016,
				"errorDescription": "corpAccessToken is invalid",
				"traceId": "E-2",
			}));
		})
		.await;
	let client = client(config(&server));
	let err = client
		.request(QUERY_ENDPOINT, json!({}))
		.await
		.expect_err("Persistent business errors must surface.");

	assert!(matches!(err, Error::RetryExhausted { attempts: 3, .. }));
	assert!(matches!(
		err.last_error(),
		Error::Application(ApplicationError { code: 20016, message, trace_id: Some(trace) })
			if message == "corpAccessToken is invalid" && trace == "E-2"
	));

	query.assert_calls_async(3).await;
}

#[tokio::test]
async fn token_endpoint_outage_surfaces_last_status() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_ENDPOINT);
			then.status(503).body("upstream unavailable");
		})
		.await;
	let client = client(config(&server));
	let err = client
		.credentials()
		.acquire()
		.await
		.expect_err("Unavailable token endpoint must fail.");

	assert!(matches!(
		err.last_error(),
		Error::Transient(TransientError::UnexpectedStatus { status: 503, .. })
	));
	assert!(!client.credentials().is_valid());

	token.assert_calls_async(3).await;
}

#[tokio::test]
async fn unreachable_server_is_a_transport_failure() {
	let mut config = config(&MockServer::start_async().await);

	// Port 9 (discard) is closed on test hosts; connections are refused quickly.
	config.transport.base_url = "http://127.0.0.1:9".into();

	let client = client(config);
	let err = client.credentials().acquire().await.expect_err("Refused connections must fail.");

	assert!(matches!(err, Error::RetryExhausted { attempts: 3, .. }));
	assert!(matches!(err.last_error(), Error::Transport(_)));
}
