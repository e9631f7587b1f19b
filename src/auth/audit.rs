//! Append-only audit trail of authenticate/refresh attempts.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, TokenId},
};

/// Lifecycle action recorded by an [`AuditEntry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
	/// Initial authorization-code exchange produced (or attempted to produce) a record.
	Created,
	/// Refresh-grant exchange rotated (or attempted to rotate) an existing record.
	Refreshed,
}
impl AuditAction {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuditAction::Created => "created",
			AuditAction::Refreshed => "refreshed",
		}
	}
}
impl Display for AuditAction {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One row per lifecycle attempt, success or failure.
///
/// Written after every authenticate/refresh attempt regardless of outcome and never mutated or
/// deleted by this crate; retention is an external concern.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
	/// Account the attempt targeted.
	pub account: AccountId,
	/// Token record the attempt produced or touched; absent when no record was produced.
	pub token: Option<TokenId>,
	/// Action kind.
	pub action: AuditAction,
	/// Whether the attempt succeeded.
	pub success: bool,
	/// Failure description for unsuccessful attempts.
	pub error_message: Option<String>,
	/// Instant the entry was recorded.
	pub recorded_at: OffsetDateTime,
}
impl AuditEntry {
	/// Records a successful attempt that touched the given token record.
	pub fn success(account: AccountId, token: TokenId, action: AuditAction) -> Self {
		Self {
			account,
			token: Some(token),
			action,
			success: true,
			error_message: None,
			recorded_at: OffsetDateTime::now_utc(),
		}
	}

	/// Records a failed attempt with the surfaced error message.
	pub fn failure(
		account: AccountId,
		token: Option<TokenId>,
		action: AuditAction,
		message: impl Into<String>,
	) -> Self {
		Self {
			account,
			token,
			action,
			success: false,
			error_message: Some(message.into()),
			recorded_at: OffsetDateTime::now_utc(),
		}
	}
}
