//! Cached corp access credential, lifecycle helpers, and read-only snapshots.

// self
use crate::{
	_prelude::*,
	auth::{TenantId, TokenSecret},
};

/// Authorization state cached by the credential manager.
///
/// A credential always carries both its token and its issued-at instant; the "nothing
/// cached" state is modeled by the manager holding `None`. Records are replaced wholesale on
/// every refresh and never mutated field by field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
	/// Corp access token; callers must avoid logging it.
	pub token: TokenSecret,
	/// Enterprise the token was minted for (`corpId`).
	pub tenant_id: TenantId,
	/// Instant the token was cached.
	pub issued_at: OffsetDateTime,
	/// Lifetime declared by the provider at issuance (`expiresIn`), in seconds.
	pub ttl_seconds: i64,
	/// Instant of the acquisition that produced this record.
	pub last_refresh_at: OffsetDateTime,
}
impl Credential {
	/// Creates a credential issued (and refreshed) at `issued_at`.
	pub fn new(
		token: impl Into<TokenSecret>,
		tenant_id: TenantId,
		ttl_seconds: i64,
		issued_at: OffsetDateTime,
	) -> Self {
		Self { token: token.into(), tenant_id, issued_at, ttl_seconds, last_refresh_at: issued_at }
	}

	/// Declared lifetime as a [`Duration`].
	pub fn ttl(&self) -> Duration {
		Duration::seconds(self.ttl_seconds)
	}

	/// Instant at which the credential stops being valid, saturating at the latest
	/// representable instant.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.issued_at.saturating_add(self.ttl())
	}

	/// Lifetime left at `now`; negative once expired.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		self.ttl() - (now - self.issued_at)
	}

	/// Time elapsed since the acquisition that produced this record.
	pub fn since_refresh_at(&self, now: OffsetDateTime) -> Duration {
		now - self.last_refresh_at
	}

	/// Returns `true` while `now - issued_at < ttl` (strict).
	pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
		now - self.issued_at < self.ttl()
	}

	/// Builds a read-only view of the credential at `now`.
	pub fn snapshot_at(&self, now: OffsetDateTime) -> CredentialSnapshot {
		CredentialSnapshot {
			token: Some(self.token.clone()),
			tenant_id: Some(self.tenant_id.clone()),
			ttl_seconds: Some(self.ttl_seconds),
			issued_at: Some(self.issued_at),
			is_valid: self.is_valid_at(now),
		}
	}
}

/// Side-effect-free view returned by `current_snapshot`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialSnapshot {
	/// Cached token, if any.
	pub token: Option<TokenSecret>,
	/// Cached tenant, if any.
	pub tenant_id: Option<TenantId>,
	/// Declared lifetime in seconds, if any.
	pub ttl_seconds: Option<i64>,
	/// Issued-at instant, if any.
	pub issued_at: Option<OffsetDateTime>,
	/// Whether the cached token is valid at snapshot time.
	pub is_valid: bool,
}
impl CredentialSnapshot {
	/// Snapshot of an empty cache.
	pub fn empty() -> Self {
		Self::default()
	}
}
