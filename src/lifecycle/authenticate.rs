//! Initial authorization-code exchange producing (or replacing) an account's token record.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, AuditAction, AuditEntry, TokenId, TokenRecord},
	crypto::SecretString,
	exchange::{CodeGrant, TokenExchange},
	lifecycle::TokenLifecycleManager,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Summary returned by [`TokenLifecycleManager::authenticate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticationOutcome {
	/// Identifier of the stored token record.
	pub token_id: TokenId,
	/// Absolute expiration instant of the new access token.
	pub expires_at: OffsetDateTime,
	/// Validity window granted by the provider.
	pub expires_in: Duration,
}

impl<X> TokenLifecycleManager<X>
where
	X: ?Sized + TokenExchange,
{
	/// Exchanges a one-time authorization code and stores the sealed token pair.
	///
	/// A second call for the same account replaces the existing record rather than duplicating
	/// it, and the refresh counter restarts at zero. Every attempt is audited, success or not.
	pub async fn authenticate(
		&self,
		account: &AccountId,
		code: &str,
	) -> Result<AuthenticationOutcome> {
		const KIND: FlowKind = FlowKind::Authenticate;

		let span = FlowSpan::for_account(KIND, "authenticate", account);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.metrics.record_authenticate_attempt();

		let result = span.instrument(self.authenticate_inner(account, code)).await;

		match &result {
			Ok(_) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
				self.metrics.record_authenticate_success();
			},
			Err(_) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				self.metrics.record_authenticate_failure();
			},
		}

		result
	}

	async fn authenticate_inner(
		&self,
		account: &AccountId,
		code: &str,
	) -> Result<AuthenticationOutcome> {
		let credential = self.load_active_account(account).await?;
		let client_secret = self.cipher.open(&credential.client_secret)?;
		let guard = self.account_guard(account);
		let _singleflight = guard.lock().await;
		let response = match self
			.exchange
			.exchange_code(CodeGrant {
				client_id: &credential.client_id,
				client_secret: client_secret.expose(),
				code,
				redirect_uri: credential.redirect_uri.as_str(),
			})
			.await
		{
			Ok(response) => response,
			Err(e) => {
				self.record_audit(AuditEntry::failure(
					account.clone(),
					None,
					AuditAction::Created,
					e.to_string(),
				))
				.await;

				return Err(e.into());
			},
		};
		// The code grant must yield a refresh token and a positive validity window; anything
		// else counts as an exchange failure for the audit trail.
		let grant = response.validity().and_then(|expires_in| {
			response.require_refresh_token().map(|refresh_token| (expires_in, refresh_token))
		});
		let (expires_in, refresh_token) = match grant {
			Ok(grant) => grant,
			Err(e) => {
				self.record_audit(AuditEntry::failure(
					account.clone(),
					None,
					AuditAction::Created,
					e.to_string(),
				))
				.await;

				return Err(e.into());
			},
		};
		let issued_at = OffsetDateTime::now_utc();
		// The provider has already consumed the one-time code at this point; a persistence
		// failure still leaves a trace in the audit trail.
		let persisted = async {
			let sealed_access = self.cipher.seal(&SecretString::new(&response.access_token))?;
			let sealed_refresh = self.cipher.seal(&SecretString::new(refresh_token))?;
			let record = TokenRecord::issue(
				account.clone(),
				sealed_access,
				sealed_refresh,
				response.token_type.clone(),
				issued_at,
				expires_in,
			);

			Ok::<_, Error>(self.tokens.upsert(record).await?)
		}
		.await;
		let stored = match persisted {
			Ok(stored) => stored,
			Err(e) => {
				self.record_audit(AuditEntry::failure(
					account.clone(),
					None,
					AuditAction::Created,
					e.to_string(),
				))
				.await;

				return Err(e);
			},
		};

		self.record_audit(AuditEntry::success(
			account.clone(),
			stored.id.clone(),
			AuditAction::Created,
		))
		.await;

		Ok(AuthenticationOutcome { token_id: stored.id, expires_at: stored.expires_at, expires_in })
	}
}
