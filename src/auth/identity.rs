//! Identity parameters used to mint corp access tokens.

// std
use std::env;
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Environment variable holding the app id read by [`Identity::from_env`].
pub const ENV_APP_ID: &str = "FXIAOKE_APP_ID";
/// Environment variable holding the app secret read by [`Identity::from_env`].
pub const ENV_APP_SECRET: &str = "FXIAOKE_APP_SECRET";
/// Environment variable holding the permanent code read by [`Identity::from_env`].
pub const ENV_PERMANENT_CODE: &str = "FXIAOKE_PERMANENT_CODE";

/// Opaque app identity; values are forwarded to the provider verbatim and never inspected.
///
/// Every field is optional at construction so a runtime can be assembled before the
/// identity is known. Absent or empty values surface as [`ConfigError::MissingIdentity`] on
/// the first credential acquisition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Identity {
	/// Application identifier (`appId`).
	pub app_id: Option<String>,
	/// Application secret (`appSecret`).
	pub app_secret: Option<TokenSecret>,
	/// Enterprise permanent authorization code (`permanentCode`).
	pub permanent_code: Option<TokenSecret>,
}
impl Identity {
	/// Creates a fully populated identity.
	pub fn new(
		app_id: impl Into<String>,
		app_secret: impl Into<String>,
		permanent_code: impl Into<String>,
	) -> Self {
		Self {
			app_id: Some(app_id.into()),
			app_secret: Some(TokenSecret::new(app_secret)),
			permanent_code: Some(TokenSecret::new(permanent_code)),
		}
	}

	/// Reads the identity from `FXIAOKE_APP_ID`, `FXIAOKE_APP_SECRET`, and
	/// `FXIAOKE_PERMANENT_CODE`; unset variables stay absent.
	pub fn from_env() -> Self {
		Self {
			app_id: env::var(ENV_APP_ID).ok(),
			app_secret: env::var(ENV_APP_SECRET).ok().map(TokenSecret::new),
			permanent_code: env::var(ENV_PERMANENT_CODE).ok().map(TokenSecret::new),
		}
	}

	/// Fails with [`ConfigError::MissingIdentity`] naming the first absent parameter.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.fields().map(|_| ())
	}

	/// Builds the JSON body of the credential fetch: `{appId, appSecret, permanentCode}`.
	pub fn token_request_body(&self) -> Result<serde_json::Value, ConfigError> {
		let (app_id, app_secret, permanent_code) = self.fields()?;

		Ok(serde_json::to_value(TokenRequestBody { app_id, app_secret, permanent_code })?)
	}

	fn fields(&self) -> Result<(&str, &str, &str), ConfigError> {
		let app_id = self
			.app_id
			.as_deref()
			.filter(|v| !v.is_empty())
			.ok_or(ConfigError::MissingIdentity { name: "appId" })?;
		let app_secret = self
			.app_secret
			.as_ref()
			.filter(|v| !v.is_empty())
			.ok_or(ConfigError::MissingIdentity { name: "appSecret" })?;
		let permanent_code = self
			.permanent_code
			.as_ref()
			.filter(|v| !v.is_empty())
			.ok_or(ConfigError::MissingIdentity { name: "permanentCode" })?;

		Ok((app_id, app_secret.expose(), permanent_code.expose()))
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequestBody<'a> {
	app_id: &'a str,
	app_secret: &'a str,
	permanent_code: &'a str,
}
