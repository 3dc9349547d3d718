//! Resilient Fxiaoke open-API runtime—cached corp access tokens with scheduled refresh, rate
//! gating, and exponential-backoff retries in one crate built for production.
//!
//! The crate is organized leaf-first:
//!
//! - [`clock`] supplies `now()` + `sleep()` so every timing decision can be driven by tests.
//! - [`http`] defines the [`Transport`](http::Transport) seam plus the default reqwest adapter.
//! - [`api`] decodes the provider envelope into a tagged success/business-error result.
//! - [`rate`] spaces outbound calls with a minimum-interval gate.
//! - [`retry`] runs an operation with bounded retries and exponential backoff.
//! - [`manager`] caches the corp access token and refreshes it before expiry.
//! - [`client`] composes the pieces into the `request(endpoint, payload)` contract.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod manager;
pub mod obs;
pub mod rate;
pub mod retry;

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}
#[cfg(test)]
mod _test {
	//! Scripted transport shared by unit tests.

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		_prelude::*,
		error::TransportError,
		http::{HttpReply, Transport, TransportFuture},
	};

	/// One scripted outcome for [`ScriptedTransport`].
	pub(crate) enum Step {
		Reply(u16, String),
		/// Replies only after the given delay elapses on the tokio timer.
		Delayed(Duration, u16, String),
		Fail,
	}

	/// Transport that replays scripted outcomes and records every call.
	#[derive(Default)]
	pub(crate) struct ScriptedTransport {
		steps: Mutex<VecDeque<Step>>,
		fallback: Mutex<Option<(u16, String)>>,
		calls: Mutex<Vec<(String, serde_json::Value)>>,
	}
	impl ScriptedTransport {
		pub(crate) fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
			Arc::new(Self { steps: Mutex::new(steps.into_iter().collect()), ..Default::default() })
		}

		/// Replies with the same body once the script is exhausted.
		pub(crate) fn repeating(status: u16, body: impl Into<String>) -> Arc<Self> {
			let transport = Self::default();

			*transport.fallback.lock() = Some((status, body.into()));

			Arc::new(transport)
		}

		pub(crate) fn calls(&self) -> Vec<(String, serde_json::Value)> {
			self.calls.lock().clone()
		}

		pub(crate) fn call_count(&self) -> usize {
			self.calls.lock().len()
		}
	}
	impl Transport for ScriptedTransport {
		fn post<'a>(&'a self, endpoint: &'a str, body: &'a serde_json::Value) -> TransportFuture<'a> {
			self.calls.lock().push((endpoint.to_owned(), body.clone()));

			let step = self.steps.lock().pop_front();
			let step = step.or_else(|| self.fallback.lock().clone().map(|(s, b)| Step::Reply(s, b)));

			Box::pin(async move {
				match step {
					Some(Step::Reply(status, body)) =>
						Ok(HttpReply { status, body: body.into_bytes() }),
					Some(Step::Delayed(delay, status, body)) => {
						tokio::time::sleep(crate::clock::to_std(delay)).await;

						Ok(HttpReply { status, body: body.into_bytes() })
					},
					Some(Step::Fail) | None => Err(TransportError::network(std::io::Error::new(
						std::io::ErrorKind::ConnectionReset,
						"scripted connection reset",
					))),
				}
			})
		}
	}

	pub(crate) fn token_body(token: &str, expires_in: i64) -> String {
		format!(
			"{{\"errorCode\":0,\"errorMessage\":\"success\",\"corpAccessToken\":\"{token}\",\"corpId\":\"corp-1\",\"expiresIn\":{expires_in}}}"
		)
	}
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use time;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
