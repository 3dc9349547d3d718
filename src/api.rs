//! Provider response envelope.
//!
//! Every Fxiaoke open-API response is a JSON object carrying `errorCode` next to the
//! endpoint-specific fields. A zero code is a success; anything else is a business failure,
//! even though the HTTP status is 200. [`ApiResponse`] makes the two outcomes explicit.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	auth::{TenantId, TokenSecret},
	error::{ApplicationError, TransientError},
};

/// Path of the corp access token endpoint.
pub const TOKEN_ENDPOINT: &str = "/cgi/corpAccessToken/get/V2";

/// Tagged provider response.
#[derive(Clone, Debug, PartialEq)]
pub enum ApiResponse {
	/// `errorCode == 0`.
	Success(ApiPayload),
	/// Non-zero `errorCode`.
	Failure(ApiFailure),
}
impl ApiResponse {
	/// Parses a raw response body returned by `endpoint`.
	///
	/// Malformed JSON or a missing `errorCode` is reported as
	/// [`TransientError::ResponseParse`].
	pub fn from_slice(endpoint: &str, body: &[u8]) -> Result<Self> {
		let de = &mut serde_json::Deserializer::from_slice(body);
		let envelope: Envelope = serde_path_to_error::deserialize(de).map_err(|source| {
			TransientError::ResponseParse { endpoint: endpoint.to_owned(), source }
		})?;

		Ok(Self::from_envelope(envelope))
	}

	/// Returns the success payload, if any.
	pub fn payload(&self) -> Option<&ApiPayload> {
		match self {
			Self::Success(payload) => Some(payload),
			Self::Failure(_) => None,
		}
	}

	/// Converts business failures into [`Error::Application`].
	pub fn into_payload(self) -> Result<ApiPayload> {
		match self {
			Self::Success(payload) => Ok(payload),
			Self::Failure(failure) => Err(ApplicationError::from(failure).into()),
		}
	}

	fn from_envelope(envelope: Envelope) -> Self {
		let Envelope { error_code, error_message, error_description, trace_id, fields } = envelope;

		if error_code == 0 {
			return Self::Success(ApiPayload { endpoint: None, trace_id, fields });
		}

		let message = error_message
			.filter(|m| !m.is_empty())
			.or(error_description)
			.unwrap_or_else(|| "unknown error".into());

		Self::Failure(ApiFailure { code: error_code, message, trace_id })
	}
}

/// Business-error variant of the envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiFailure {
	/// Non-zero provider code.
	pub code: i64,
	/// `errorMessage`, falling back to `errorDescription`.
	pub message: String,
	/// Provider trace identifier.
	pub trace_id: Option<String>,
}
impl From<ApiFailure> for ApplicationError {
	fn from(failure: ApiFailure) -> Self {
		Self { code: failure.code, message: failure.message, trace_id: failure.trace_id }
	}
}

/// Success variant of the envelope: every top-level field except the status fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ApiPayload {
	/// Endpoint the payload came from, used to label decoding failures.
	pub endpoint: Option<String>,
	/// Provider trace identifier.
	pub trace_id: Option<String>,
	/// Remaining top-level fields.
	pub fields: Map<String, Value>,
}
impl ApiPayload {
	/// Tags the payload with the endpoint that produced it.
	pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.endpoint = Some(endpoint.into());

		self
	}

	/// Looks up a top-level field.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.fields.get(key)
	}

	/// Decodes the payload fields into `T`, reporting the failing path on mismatch.
	pub fn decode<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let value = Value::Object(self.fields.clone());

		serde_path_to_error::deserialize(value).map_err(|source| Error::Decode {
			endpoint: self.endpoint.clone().unwrap_or_default(),
			source,
		})
	}
}

/// Credential grant carried by a successful token response.
///
/// Decoding rejects an empty token, a malformed `corpId`, and a non-positive lifetime, so a
/// decoded grant is always cacheable.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
	/// Corp access token.
	#[serde(deserialize_with = "non_empty_secret")]
	pub corp_access_token: TokenSecret,
	/// Enterprise identifier.
	pub corp_id: TenantId,
	/// Declared lifetime in seconds; accepts a number or a numeric string.
	#[serde(deserialize_with = "positive_lenient_i64")]
	pub expires_in: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
	error_code: i64,
	#[serde(default)]
	error_message: Option<String>,
	#[serde(default)]
	error_description: Option<String>,
	#[serde(default)]
	trace_id: Option<String>,
	#[serde(flatten)]
	fields: Map<String, Value>,
}

fn positive_lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
	D: serde::Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Lenient {
		Number(i64),
		Text(String),
	}

	let value = match Lenient::deserialize(deserializer)? {
		Lenient::Number(value) => value,
		Lenient::Text(raw) => raw.trim().parse().map_err(serde::de::Error::custom)?,
	};

	if value <= 0 {
		return Err(serde::de::Error::custom("expected a positive lifetime"));
	}

	Ok(value)
}

fn non_empty_secret<'de, D>(deserializer: D) -> Result<TokenSecret, D::Error>
where
	D: serde::Deserializer<'de>,
{
	let secret = TokenSecret::deserialize(deserializer)?;

	if secret.is_empty() {
		return Err(serde::de::Error::custom("expected a non-empty token"));
	}

	Ok(secret)
}
