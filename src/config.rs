//! Aggregate runtime configuration.
//!
//! [`ClientConfig`] bundles every knob the runtime reads: identity, retry policy, refresh
//! windows, rate gate, and transport settings. All sections default to the provider's
//! documented values, so a config only needs to override what differs. Durations are
//! expressed on the wire as integer milliseconds (`*Ms`) or seconds, matching the camelCase
//! field names used by JSON configuration documents.

// self
use crate::{
	_prelude::*,
	auth::Identity,
	error::ConfigError,
	http::TransportConfig,
	manager::RefreshWindows,
	rate::RateConfig,
	retry::RetryPolicy,
};

/// Complete configuration consumed by [`ApiClient`](crate::client::ApiClient).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
	/// Enterprise identity parameters.
	pub identity: Identity,
	/// Retry policy shared by token acquisition and business requests.
	pub retry: RetryPolicy,
	/// Credential cache and refresh window settings.
	pub windows: RefreshWindows,
	/// Minimum spacing between business requests.
	pub rate: RateConfig,
	/// Default HTTP transport settings.
	pub transport: TransportConfig,
}
impl ClientConfig {
	/// Creates a config with defaults for everything but the identity.
	pub fn new(identity: Identity) -> Self {
		Self { identity, ..Default::default() }
	}

	/// Builds a config whose identity is read from the `FXIAOKE_*` environment variables.
	pub fn from_env() -> Self {
		Self::new(Identity::from_env())
	}

	/// Parses a JSON configuration document, reporting the offending path on failure.
	///
	/// The document is validated before it is returned.
	pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
		let de = &mut serde_json::Deserializer::from_str(raw);
		let config: Self =
			serde_path_to_error::deserialize(de).map_err(|source| ConfigError::Parse { source })?;

		config.validate()?;

		Ok(config)
	}

	/// Replaces the retry policy.
	pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	/// Replaces the refresh window settings.
	pub fn with_windows(mut self, windows: RefreshWindows) -> Self {
		self.windows = windows;

		self
	}

	/// Replaces the rate gate settings.
	pub fn with_rate(mut self, rate: RateConfig) -> Self {
		self.rate = rate;

		self
	}

	/// Replaces the transport settings.
	pub fn with_transport(mut self, transport: TransportConfig) -> Self {
		self.transport = transport;

		self
	}

	/// Overrides the provider base URL.
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.transport.base_url = base_url.into();

		self
	}

	/// Validates every section; identity is checked first.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.identity.validate()?;
		self.retry.validate()?;
		self.windows.validate()?;
		self.rate.validate()?;
		self.transport.validate()
	}
}

/// Serializes [`Duration`] as integer milliseconds.
pub(crate) mod serde_millis {
	// crates.io
	use serde::{Deserializer, Serializer, ser::Error as _};
	// self
	use crate::_prelude::*;

	pub(crate) fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let millis = i64::try_from(duration.whole_milliseconds()).map_err(S::Error::custom)?;

		serializer.serialize_i64(millis)
	}

	pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::milliseconds)
	}
}

/// Serializes [`Duration`] as integer seconds.
pub(crate) mod serde_seconds {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	pub(crate) fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(duration.whole_seconds())
	}

	pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::seconds)
	}
}
