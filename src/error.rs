//! Runtime-level error types shared across the executor, manager, and client.

// self
use crate::_prelude::*;

/// Runtime-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical runtime error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; never retried.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Temporary upstream failure; retried by the executor.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Provider reported a non-zero `errorCode` inside a successful transport response.
	#[error(transparent)]
	Application(#[from] ApplicationError),
	/// A successful payload does not match the expected shape.
	#[error("Response payload from `{endpoint}` could not be decoded.")]
	Decode {
		/// Endpoint path the payload came from.
		endpoint: String,
		/// Structured decoding failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// All attempts failed; wraps the last underlying error.
	#[error("Request failed after {attempts} attempt(s): {source}")]
	RetryExhausted {
		/// Number of attempts performed.
		attempts: u32,
		/// Error raised by the final attempt.
		#[source]
		source: Box<Error>,
	},
}
impl Error {
	/// Returns `true` when the executor may retry the failed attempt.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Transport(_) | Self::Transient(_) | Self::Application(_))
	}

	/// Returns the innermost error, unwrapping [`Error::RetryExhausted`].
	pub fn last_error(&self) -> &Error {
		match self {
			Self::RetryExhausted { source, .. } => source.last_error(),
			other => other,
		}
	}
}

/// Configuration and validation failures raised by the runtime.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required identity parameter is absent or empty.
	#[error("Missing required identity parameter `{name}`.")]
	MissingIdentity {
		/// Wire name of the missing parameter.
		name: &'static str,
	},
	/// Retry policy violates its bounds.
	#[error("Retry policy is invalid: {reason}.")]
	InvalidRetryPolicy {
		/// Human-readable explanation.
		reason: &'static str,
	},
	/// Refresh window configuration violates its ordering.
	#[error("Refresh window configuration is invalid: {reason}.")]
	InvalidRefreshWindows {
		/// Human-readable explanation.
		reason: &'static str,
	},
	/// Rate gate configuration violates its bounds.
	#[error("Rate gate configuration is invalid: {reason}.")]
	InvalidRateConfig {
		/// Human-readable explanation.
		reason: &'static str,
	},
	/// Base URL or endpoint path cannot be parsed.
	#[error("Endpoint URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Business request payload is not a JSON object.
	#[error("Request payload for `{endpoint}` must be a JSON object.")]
	InvalidPayload {
		/// Endpoint path the payload was meant for.
		endpoint: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	Serialize(#[from] serde_json::Error),
	/// Configuration document could not be parsed.
	#[error("Configuration document is invalid.")]
	Parse {
		/// Structured parsing failure including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Provider answered with a non-success HTTP status.
	#[error("Endpoint `{endpoint}` returned HTTP status {status}.")]
	UnexpectedStatus {
		/// Endpoint path that was called.
		endpoint: String,
		/// HTTP status code.
		status: u16,
	},
	/// Provider responded with malformed JSON that could not be parsed as an envelope.
	#[error("Endpoint `{endpoint}` returned malformed JSON.")]
	ResponseParse {
		/// Endpoint path that was called.
		endpoint: String,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying HTTP client gave up waiting for a response.
	#[error("Request timed out while calling the provider.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Business failure encoded inside a successful transport response.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Provider returned error code {code}: {message}.")]
pub struct ApplicationError {
	/// Non-zero provider `errorCode`.
	pub code: i64,
	/// Provider `errorMessage`, falling back to `errorDescription`.
	pub message: String,
	/// Provider trace identifier, when supplied.
	pub trace_id: Option<String>,
}
