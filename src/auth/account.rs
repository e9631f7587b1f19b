//! Account registration input and the durable credential record.

// self
use crate::{
	_prelude::*,
	auth::AccountId,
	crypto::{Sealed, SecretString},
	error::ConfigError,
};

/// Validated registration input for one advertising account's OAuth client.
///
/// Construction is the validation boundary: a value of this type always carries a non-empty
/// name, client id, and client secret plus a parseable redirect URI.
#[derive(Clone, Debug)]
pub struct AccountConfig {
	pub(crate) name: String,
	pub(crate) client_id: String,
	pub(crate) client_secret: SecretString,
	pub(crate) redirect_uri: Url,
}
impl AccountConfig {
	/// Validates and assembles a registration request.
	pub fn new(
		name: impl Into<String>,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		redirect_uri: &str,
	) -> Result<Self, ConfigError> {
		let name = non_empty("account name", name.into())?;
		let client_id = non_empty("client id", client_id.into())?;
		let client_secret = non_empty("client secret", client_secret.into())?;
		let redirect_uri =
			Url::parse(redirect_uri).map_err(|source| ConfigError::InvalidRedirect { source })?;

		Ok(Self { name, client_id, client_secret: SecretString::new(client_secret), redirect_uri })
	}

	/// Human-readable account name. Names are not unique across accounts.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// OAuth client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// OAuth client secret; sealed before it is ever persisted.
	pub fn client_secret(&self) -> &SecretString {
		&self.client_secret
	}

	/// OAuth redirect URI, which must match the upstream app configuration.
	pub fn redirect_uri(&self) -> &Url {
		&self.redirect_uri
	}
}

/// Durable record of one account's OAuth client credentials.
///
/// Created once via registration; the client id and secret are immutable afterwards. Accounts
/// are never hard-deleted; clearing [`active`](Self::active) logically removes them while the
/// audit trail stays intact.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountCredential {
	/// Opaque unique key for the account.
	pub id: AccountId,
	/// Human-readable name; uniqueness is not enforced.
	pub name: String,
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret, encrypted at rest.
	pub client_secret: Sealed,
	/// Redirect URI registered with the provider.
	pub redirect_uri: Url,
	/// Logical-deletion flag; inactive accounts cannot authenticate.
	pub active: bool,
	/// Registration instant.
	pub created_at: OffsetDateTime,
}
impl AccountCredential {
	/// Logically deletes the account; the record itself is retained.
	pub fn deactivate(&mut self) {
		self.active = false;
	}
}

fn non_empty(field: &'static str, value: String) -> Result<String, ConfigError> {
	if value.trim().is_empty() { Err(ConfigError::EmptyField { field }) } else { Ok(value) }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn config_rejects_empty_fields() {
		assert!(matches!(
			AccountConfig::new("", "client", "secret", "https://localhost"),
			Err(ConfigError::EmptyField { field: "account name" }),
		));
		assert!(matches!(
			AccountConfig::new("ads-main", " ", "secret", "https://localhost"),
			Err(ConfigError::EmptyField { field: "client id" }),
		));
		assert!(matches!(
			AccountConfig::new("ads-main", "client", "", "https://localhost"),
			Err(ConfigError::EmptyField { field: "client secret" }),
		));
	}

	#[test]
	fn config_rejects_unparseable_redirects() {
		assert!(matches!(
			AccountConfig::new("ads-main", "client", "secret", "not a uri"),
			Err(ConfigError::InvalidRedirect { .. }),
		));
	}

	#[test]
	fn config_keeps_validated_values() {
		let config = AccountConfig::new("ads-main", "client", "secret", "https://localhost/cb")
			.expect("Valid registration input should pass.");

		assert_eq!(config.name(), "ads-main");
		assert_eq!(config.client_id(), "client");
		assert_eq!(config.client_secret().expose(), "secret");
		assert_eq!(config.redirect_uri().as_str(), "https://localhost/cb");
	}

	#[test]
	fn debug_never_reveals_the_client_secret() {
		let config = AccountConfig::new("ads-main", "client", "super-secret", "https://localhost")
			.expect("Valid registration input should pass.");

		assert!(!format!("{config:?}").contains("super-secret"));
	}

	#[test]
	fn deactivation_is_a_logical_delete() {
		let mut credential = AccountCredential {
			id: AccountId::generate(),
			name: "ads-main".into(),
			client_id: "client".into(),
			client_secret: Sealed::from_encoded("blob"),
			redirect_uri: Url::parse("https://localhost").expect("Fixture URI should parse."),
			active: true,
			created_at: OffsetDateTime::now_utc(),
		};

		credential.deactivate();

		assert!(!credential.active);
	}
}
