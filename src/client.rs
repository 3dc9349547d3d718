//! High-level API client composing the credential manager, rate gate, and retry executor.
//!
//! [`ApiClient::request`] is the `request(endpoint, payload)` contract: it acquires a valid
//! corp access token, injects `corpAccessToken` + `corpId` into the JSON body, waits for the
//! rate gate, and posts through the executor so business error codes are retried like any
//! other failed attempt.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
#[cfg(feature = "reqwest")] use crate::{clock::TokioClock, http::ReqwestTransport};
use crate::{
	_prelude::*,
	api::ApiPayload,
	clock::Clock,
	config::ClientConfig,
	error::ConfigError,
	http::{self, Transport},
	manager::CredentialManager,
	obs::{self, OpKind, OpOutcome, OpSpan},
	rate::RateGate,
	retry::Executor,
};

/// Body field carrying the corp access token on business calls.
pub const ACCESS_TOKEN_FIELD: &str = "corpAccessToken";
/// Body field carrying the enterprise identifier on business calls.
pub const CORP_ID_FIELD: &str = "corpId";

/// Resilient client for Fxiaoke open-API business endpoints.
#[derive(Clone)]
pub struct ApiClient {
	manager: CredentialManager,
	gate: Arc<RateGate>,
	executor: Executor,
	transport: Arc<dyn Transport>,
}
impl ApiClient {
	/// Builds a client backed by the default reqwest transport and tokio clock.
	#[cfg(feature = "reqwest")]
	pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
		let transport = ReqwestTransport::new(&config.transport)?;

		Self::with_transport(config, Arc::new(transport), Arc::new(TokioClock::new()))
	}

	/// Builds a client around caller-provided transport + clock implementations.
	///
	/// Retry, window, and rate settings are validated here; identity parameters are checked
	/// on the first credential acquisition.
	pub fn with_transport(
		config: ClientConfig,
		transport: Arc<dyn Transport>,
		clock: Arc<dyn Clock>,
	) -> Result<Self, ConfigError> {
		let ClientConfig { identity, retry, windows, rate, .. } = config;

		retry.validate()?;

		let executor = Executor::new(retry, clock.clone());
		let gate = Arc::new(RateGate::new(&rate, clock.clone())?);
		let manager =
			CredentialManager::new(identity, windows, executor.clone(), transport.clone(), clock)?;

		Ok(Self { manager, gate, executor, transport })
	}

	/// Underlying credential manager.
	pub fn credentials(&self) -> &CredentialManager {
		&self.manager
	}

	/// Rate gate shared by every request of this client.
	pub fn rate_gate(&self) -> &RateGate {
		&self.gate
	}

	/// Posts `payload` to `endpoint` with credentials injected.
	///
	/// `payload` must be a JSON object; caller-supplied `corpAccessToken`/`corpId` fields are
	/// overwritten. The rate gate is awaited once per request, before the first attempt.
	pub async fn request(&self, endpoint: &str, payload: Value) -> Result<ApiPayload> {
		const KIND: OpKind = OpKind::Request;

		let span = OpSpan::new(KIND, "request");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.send(endpoint, payload)).await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Same as [`request`](Self::request), decoding the success payload into `T`.
	pub async fn request_as<T>(&self, endpoint: &str, payload: Value) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.request(endpoint, payload).await?.decode()
	}

	/// Shuts the credential manager down.
	pub fn shutdown(&self) {
		self.manager.shutdown();
	}

	async fn send(&self, endpoint: &str, payload: Value) -> Result<ApiPayload> {
		let Value::Object(mut body) = payload else {
			return Err(ConfigError::InvalidPayload { endpoint: endpoint.to_owned() }.into());
		};
		let credential = self.manager.acquire().await?;

		body.insert(ACCESS_TOKEN_FIELD.into(), credential.token.expose().into());
		body.insert(CORP_ID_FIELD.into(), credential.tenant_id.to_string().into());

		let body = Value::Object(body);

		self.gate.wait().await;

		let payload = self
			.executor
			.run(OpKind::Request, || http::fetch_envelope(self.transport.as_ref(), endpoint, &body))
			.await?;

		Ok(payload.with_endpoint(endpoint))
	}
}
impl Debug for ApiClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("manager", &self.manager)
			.field("gate", &self.gate)
			.field("executor", &self.executor)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_test::{ScriptedTransport, Step, token_body},
		api::TOKEN_ENDPOINT,
		auth::Identity,
		clock::TokioClock,
		error::ApplicationError,
		rate::RateConfig,
	};

	const ENDPOINT: &str = "/cgi/crm/v2/data/query";

	fn client(transport: Arc<ScriptedTransport>, rate: RateConfig) -> (ApiClient, Arc<dyn Clock>) {
		let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());
		let config = ClientConfig::new(Identity::new("FSAID_1", "app-secret", "permanent-code"))
			.with_rate(rate);
		let client = ApiClient::with_transport(config, transport, clock.clone())
			.expect("Client fixture should be valid.");

		(client, clock)
	}

	#[tokio::test(start_paused = true)]
	async fn request_injects_credentials_and_returns_payload() {
		let transport = ScriptedTransport::new([
			Step::Reply(200, token_body("t1", 7_200)),
			Step::Reply(200, r#"{"errorCode":0,"traceId":"E-9","data":{"total":1}}"#.into()),
		]);
		let (client, _clock) = client(transport.clone(), RateConfig::default());
		let payload = client
			.request(ENDPOINT, serde_json::json!({ "currentOpenUserId": "FSUID_1", "corpId": "spoof" }))
			.await
			.expect("Request should succeed.");

		assert_eq!(payload.endpoint.as_deref(), Some(ENDPOINT));
		assert_eq!(payload.trace_id.as_deref(), Some("E-9"));
		assert_eq!(payload.get("data"), Some(&serde_json::json!({ "total": 1 })));

		let calls = transport.calls();

		assert_eq!(calls[0].0, TOKEN_ENDPOINT);
		assert_eq!(
			calls[1],
			(
				ENDPOINT.to_owned(),
				serde_json::json!({
					"currentOpenUserId": "FSUID_1",
					"corpAccessToken": "t1",
					"corpId": "corp-1",
				}),
			)
		);
	}

	#[tokio::test(start_paused = true)]
	async fn non_object_payload_is_rejected_before_network() {
		let transport = ScriptedTransport::repeating(200, token_body("t1", 7_200));
		let (client, _clock) = client(transport.clone(), RateConfig::default());
		let err = client
			.request(ENDPOINT, serde_json::json!(["not", "an", "object"]))
			.await
			.expect_err("Arrays are not valid payloads.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidPayload { .. })));
		assert_eq!(transport.call_count(), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn consecutive_requests_are_spaced_by_the_gate() {
		let transport = ScriptedTransport::new([
			Step::Reply(200, token_body("t1", 7_200)),
			Step::Reply(200, r#"{"errorCode":0}"#.into()),
			Step::Reply(200, r#"{"errorCode":0}"#.into()),
		]);
		let (client, clock) = client(transport.clone(), RateConfig::default());
		let start = clock.now();

		client.request(ENDPOINT, serde_json::json!({})).await.expect("First request succeeds.");

		assert_eq!(clock.now(), start);

		client.request(ENDPOINT, serde_json::json!({})).await.expect("Second request succeeds.");

		assert!(clock.now() - start >= Duration::milliseconds(20_000));
		assert_eq!(transport.call_count(), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn business_errors_are_retried_then_surfaced() {
		let failure = r#"{"errorCode":10001,"errorMessage":"system busy","traceId":"E-3"}"#;
		let transport = ScriptedTransport::new([
			Step::Reply(200, token_body("t1", 7_200)),
			Step::Reply(200, failure.into()),
			Step::Reply(200, failure.into()),
			Step::Reply(200, failure.into()),
		]);
		let (client, _clock) = client(transport.clone(), RateConfig::new(Duration::ZERO));
		let err = client
			.request(ENDPOINT, serde_json::json!({}))
			.await
			.expect_err("Persistent business errors must surface.");

		assert!(matches!(err, Error::RetryExhausted { attempts: 3, .. }));
		assert_eq!(
			err.last_error().to_string(),
			ApplicationError { code: 10001, message: "system busy".into(), trace_id: None }
				.to_string()
		);
		assert_eq!(transport.call_count(), 4);
	}

	#[tokio::test(start_paused = true)]
	async fn request_as_decodes_typed_payload() {
		#[derive(Debug, Deserialize)]
		#[serde(rename_all = "camelCase")]
		struct User {
			open_user_id: String,
		}
		#[derive(Debug, Deserialize)]
		struct Reply {
			user: User,
		}

		let transport = ScriptedTransport::new([
			Step::Reply(200, token_body("t1", 7_200)),
			Step::Reply(200, r#"{"errorCode":0,"user":{"openUserId":"FSUID_1"}}"#.into()),
			Step::Reply(200, r#"{"errorCode":0,"user":{}}"#.into()),
		]);
		let (client, _clock) = client(transport, RateConfig::new(Duration::ZERO));
		let reply: Reply = client
			.request_as("/cgi/user/getByMobile", serde_json::json!({ "mobile": "13800000000" }))
			.await
			.expect("Typed request should decode.");

		assert_eq!(reply.user.open_user_id, "FSUID_1");

		let err = client
			.request_as::<Reply>("/cgi/user/getByMobile", serde_json::json!({}))
			.await
			.expect_err("Missing fields must fail decoding.");

		assert!(matches!(&err, Error::Decode { endpoint, .. } if endpoint == "/cgi/user/getByMobile"));
	}

	#[tokio::test(start_paused = true)]
	async fn shutdown_delegates_to_manager() {
		let transport = ScriptedTransport::repeating(200, token_body("t1", 7_200));
		let (client, _clock) = client(transport, RateConfig::default());

		client.credentials().acquire().await.expect("Acquire should succeed.");
		client.shutdown();

		assert!(client.credentials().is_shut_down());
		assert!(!client.credentials().is_valid());
	}
}
