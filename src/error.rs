//! Crate-level error types shared across the lifecycle manager, exchange client, and stores.

// self
use crate::{_prelude::*, auth::AccountId};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical lifecycle error exposed by public APIs.
///
/// The variants keep the failure domains apart on purpose: an operator must be able to tell
/// "the provider is down" ([`Error::Exchange`]) from "our database is down" ([`Error::Storage`]).
#[derive(Debug, ThisError)]
pub enum Error {
	/// Persistence layer unavailable or returned malformed data.
	#[error("{0}")]
	Storage(#[from] crate::store::StoreError),
	/// External token endpoint rejected the request or was unreachable.
	#[error(transparent)]
	Exchange(#[from] crate::exchange::ExchangeError),
	/// Configured key cannot decrypt a stored value; a fatal configuration mismatch.
	#[error(transparent)]
	Encryption(#[from] crate::crypto::EncryptionError),
	/// Local configuration or validation problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// Account identifier does not resolve to an active credential.
	#[error("Account `{account}` is not registered or is inactive.")]
	AccountNotFound {
		/// Identifier supplied by the caller.
		account: AccountId,
	},
	/// No live token record exists for the account.
	#[error("Account `{account}` has no live token record; authenticate first.")]
	TokenNotFound {
		/// Identifier supplied by the caller.
		account: AccountId,
	},
}
impl Error {
	/// Returns `true` for the two absence variants so HTTP layers can map them to 404s.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::AccountNotFound { .. } | Self::TokenNotFound { .. })
	}
}

/// Validation failures raised before any external collaborator is contacted.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required registration field was empty or whitespace.
	#[error("{field} must not be empty.")]
	EmptyField {
		/// Field label for diagnostics.
		field: &'static str,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A caller-supplied identifier failed validation.
	#[error("Identifier is invalid.")]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
}
