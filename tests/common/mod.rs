//! Fixtures shared by the reqwest-backed integration tests.

#![allow(dead_code)]

// crates.io
use httpmock::MockServer;
use serde_json::{Value, json};
use time::Duration;
// self
use fxiaoke_broker::{
	auth::Identity, client::ApiClient, config::ClientConfig, rate::RateConfig, retry::RetryPolicy,
};

pub const APP_ID: &str = "FSAID_it";
pub const APP_SECRET: &str = "it-app-secret";
pub const PERMANENT_CODE: &str = "it-permanent-code";
pub const CORP_ID: &str = "FSCORP_it";

/// Config pointing at `server` with fast retries and an open rate gate.
pub fn config(server: &MockServer) -> ClientConfig {
	ClientConfig::new(Identity::new(APP_ID, APP_SECRET, PERMANENT_CODE))
		.with_base_url(server.base_url())
		.with_retry(
			RetryPolicy::new(3, Duration::milliseconds(10), 2.)
				.expect("Retry policy fixture should be valid."),
		)
		.with_rate(RateConfig::new(Duration::ZERO))
}

/// Builds a reqwest-backed client from `config`.
pub fn client(config: ClientConfig) -> ApiClient {
	ApiClient::new(config).expect("Integration client should build.")
}

/// JSON body the token endpoint must receive.
pub fn token_request() -> Value {
	json!({ "appId": APP_ID, "appSecret": APP_SECRET, "permanentCode": PERMANENT_CODE })
}

/// Successful token endpoint response.
pub fn token_response(token: &str, expires_in: Value) -> Value {
	json!({
		"errorCode": 0,
		"errorMessage": "success",
		"corpAccessToken": token,
		"corpId": CORP_ID,
		"expiresIn": expires_in,
	})
}
