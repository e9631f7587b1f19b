//! Optional observability helpers for lifecycle operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `token_lifecycle.flow` with the `flow`
//!   (operation), `stage` (call site), and, for account-scoped flows, `account` fields, plus
//!   the warning logged when an audit append fails.
//! - Enable `metrics` to increment the `token_lifecycle_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, store::StoreError};

/// Lifecycle operations observed by the manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Initial authorization-code exchange.
	Authenticate,
	/// Forced or staleness-driven refresh exchange.
	Refresh,
	/// Cached-or-refreshed access token retrieval.
	AccessToken,
	/// Expired-record invalidation sweep.
	Cleanup,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Authenticate => "authenticate",
			FlowKind::Refresh => "refresh",
			FlowKind::AccessToken => "access_token",
			FlowKind::Cleanup => "cleanup",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a lifecycle operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Demotes an audit append failure to a warning; the audit trail is fire-and-forget relative to
/// the primary token operation.
pub fn warn_audit_append_failed(error: &StoreError) {
	#[cfg(feature = "tracing")]
	::tracing::warn!(error = %error, "Failed to append audit entry.");

	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}
