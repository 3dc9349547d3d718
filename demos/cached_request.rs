//! Demonstrates issuing business requests through the default reqwest transport while the
//! corp access token is fetched once and reused from the cache.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use fxiaoke_broker::{
	api::TOKEN_ENDPOINT, auth::Identity, client::ApiClient, config::ClientConfig,
	rate::RateConfig, time::Duration,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_ENDPOINT);
			then.status(200).header("content-type", "application/json").body(
				"{\"errorCode\":0,\"corpAccessToken\":\"demo-token\",\"corpId\":\"FSCORP_demo\",\"expiresIn\":7200}",
			);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/cgi/user/getByMobile");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errorCode\":0,\"empList\":[{\"openUserId\":\"FSUID_demo\"}]}");
		})
		.await;

	let config = ClientConfig::new(Identity::new("FSAID_demo", "demo-secret", "demo-code"))
		.with_base_url(server.base_url())
		.with_rate(RateConfig::new(Duration::milliseconds(200)));
	let client = ApiClient::new(config)?;

	for mobile in ["13800000000", "13900000000"] {
		let payload = client.request("/cgi/user/getByMobile", json!({ "mobile": mobile })).await?;

		println!("Employees for {mobile}: {}.", payload.get("empList").unwrap_or(&json!([])));
	}

	token_mock.assert_async().await;
	client.shutdown();

	Ok(())
}
