//! Transport primitives for provider calls.
//!
//! [`Transport`] is the runtime's only dependency on an HTTP stack: a single JSON `POST`
//! returning the raw status and body. Status classification and envelope decoding happen in
//! [`fetch_envelope`] so every transport gets identical retry semantics. The default
//! [`ReqwestTransport`] joins endpoint paths onto a base URL and applies a per-call timeout.

// self
use crate::{
	_prelude::*,
	api::ApiResponse,
	config::serde_millis,
	error::{ConfigError, TransientError, TransportError},
};

/// Default provider base URL.
pub const DEFAULT_BASE_URL: &str = "https://open.fxiaoke.com";

/// Boxed future returned by [`Transport::post`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpReply, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP clients capable of posting JSON to provider endpoints.
///
/// Implementations must be `Send + Sync` so a single transport can be shared between the
/// credential manager, the API client, and the background refresh task.
pub trait Transport
where
	Self: Send + Sync,
{
	/// Posts `body` as JSON to `endpoint` (a path such as `/cgi/user/getByMobile`).
	fn post<'a>(&'a self, endpoint: &'a str, body: &'a serde_json::Value) -> TransportFuture<'a>;
}

/// Raw reply captured by a [`Transport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
	/// HTTP status code.
	pub status: u16,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl HttpReply {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Performs one attempt: post, reject non-2xx statuses, and decode the envelope.
pub async fn fetch_envelope(
	transport: &dyn Transport,
	endpoint: &str,
	body: &serde_json::Value,
) -> Result<ApiResponse> {
	let reply = transport.post(endpoint, body).await?;

	if !reply.is_success() {
		return Err(TransientError::UnexpectedStatus {
			endpoint: endpoint.to_owned(),
			status: reply.status,
		}
		.into());
	}

	ApiResponse::from_slice(endpoint, &reply.body)
}

/// Transport settings for the default HTTP client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransportConfig {
	/// Base URL endpoint paths are joined onto.
	pub base_url: String,
	/// Per-call timeout.
	#[serde(rename = "timeoutMs", with = "serde_millis")]
	pub timeout: Duration,
}
impl TransportConfig {
	/// Parses the configured base URL.
	pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
		Url::parse(&self.base_url).map_err(|source| ConfigError::InvalidUrl { source })
	}

	/// Ensures the base URL parses.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.parsed_base_url().map(|_| ())
	}
}
impl Default for TransportConfig {
	fn default() -> Self {
		Self { base_url: DEFAULT_BASE_URL.into(), timeout: Duration::milliseconds(10_000) }
	}
}

/// Thin wrapper around [`ReqwestClient`] bound to a provider base URL.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	base_url: Url,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a client with the configured timeout and base URL.
	pub fn new(config: &TransportConfig) -> Result<Self, ConfigError> {
		let client =
			ReqwestClient::builder().timeout(crate::clock::to_std(config.timeout)).build()?;

		Ok(Self { client, base_url: config.parsed_base_url()? })
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient, base_url: Url) -> Self {
		Self { client, base_url }
	}

	/// Returns the base URL endpoint paths are joined onto.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn post<'a>(&'a self, endpoint: &'a str, body: &'a serde_json::Value) -> TransportFuture<'a> {
		Box::pin(async move {
			let url = self.base_url.join(endpoint).map_err(TransportError::network)?;
			let response = self.client.post(url).json(body).send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(HttpReply { status, body })
		})
	}
}
