//! Token record model, staleness helpers, and the observational status snapshot.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, TokenId},
	crypto::Sealed,
};

/// Token type assumed when the provider omits one from its response.
pub const DEFAULT_TOKEN_TYPE: &str = "bearer";

/// Current credential material for one account.
///
/// At most one live record exists per account; the token store's upsert keyed on the account
/// identifier enforces that. Records are never deleted outright; the cleanup sweep clears
/// [`is_valid`](Self::is_valid) once a record is sufficiently expired.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Opaque unique key for this record.
	pub id: TokenId,
	/// Owning account identifier.
	pub account: AccountId,
	/// Access token, encrypted at rest.
	pub access_token: Sealed,
	/// Refresh token, encrypted at rest.
	pub refresh_token: Sealed,
	/// Token scheme reported by the provider.
	pub token_type: String,
	/// Absolute expiration instant of the access token.
	pub expires_at: OffsetDateTime,
	/// Cleared by the cleanup sweep once the record is sufficiently expired.
	pub is_valid: bool,
	/// Monotonic counter, incremented on every successful refresh.
	pub refresh_count: u64,
	/// Creation instant (first successful authorization-code exchange).
	pub created_at: OffsetDateTime,
	/// Instant of the most recent successful refresh; absent until the first one.
	pub last_refreshed_at: Option<OffsetDateTime>,
}
impl TokenRecord {
	/// Builds the record produced by an initial authorization-code exchange.
	pub fn issue(
		account: AccountId,
		access_token: Sealed,
		refresh_token: Sealed,
		token_type: impl Into<String>,
		issued_at: OffsetDateTime,
		expires_in: Duration,
	) -> Self {
		Self {
			id: TokenId::generate(),
			account,
			access_token,
			refresh_token,
			token_type: token_type.into(),
			expires_at: issued_at + expires_in,
			is_valid: true,
			refresh_count: 0,
			created_at: issued_at,
			last_refreshed_at: None,
		}
	}

	/// Staleness predicate: `true` once `now` is within `buffer` of the expiration instant.
	///
	/// A stale access token must never reach a caller; the manager refreshes first.
	pub fn is_stale_at(&self, now: OffsetDateTime, buffer: Duration) -> bool {
		now >= self.expires_at - buffer
	}

	/// Remaining validity in whole seconds, floored at zero for reporting.
	pub fn remaining_seconds_at(&self, now: OffsetDateTime) -> i64 {
		(self.expires_at - now).whole_seconds().max(0)
	}

	/// Applies a successful refresh to the record in place.
	pub fn apply(&mut self, update: TokenUpdate) {
		self.access_token = update.access_token;

		if let Some(refresh_token) = update.refresh_token {
			self.refresh_token = refresh_token;
		}

		self.expires_at = update.expires_at;
		self.refresh_count = update.refresh_count;
		self.last_refreshed_at = Some(update.refreshed_at);
	}
}

/// Field-level update persisted after a successful refresh exchange.
///
/// The refresh token is optional because some providers never rotate it; the stored value is
/// replaced only when the response included a new one.
#[derive(Clone, Debug)]
pub struct TokenUpdate {
	/// Replacement access token, encrypted at rest.
	pub access_token: Sealed,
	/// Replacement refresh token, when the provider supplied one.
	pub refresh_token: Option<Sealed>,
	/// Recomputed expiration instant.
	pub expires_at: OffsetDateTime,
	/// New monotonic refresh counter value.
	pub refresh_count: u64,
	/// Instant the refresh completed.
	pub refreshed_at: OffsetDateTime,
}

/// Observational token status for one account; producing it never triggers a refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TokenStatus {
	/// No live token record exists for the account.
	NotAuthenticated,
	/// A live record exists; the snapshot describes its validity window.
	Authenticated(TokenStatusReport),
	/// The status read itself failed; diagnostics instead of a propagated error.
	Error {
		/// Human-readable failure description.
		message: String,
	},
}

/// Validity-window snapshot embedded in [`TokenStatus::Authenticated`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStatusReport {
	/// Absolute expiration instant.
	pub expires_at: OffsetDateTime,
	/// Remaining validity in seconds, floored at zero.
	pub expires_in_seconds: i64,
	/// Same staleness predicate `get_access_token` uses.
	pub needs_refresh: bool,
	/// Successful refreshes performed on the current record.
	pub refresh_count: u64,
	/// Most recent successful refresh, if any.
	pub last_refreshed: Option<OffsetDateTime>,
}
