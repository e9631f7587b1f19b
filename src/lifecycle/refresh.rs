//! Refresh-grant rotation and the staleness-aware access token read.
//!
//! Both entry points route through one internal rotation path that runs under the per-account
//! singleflight guard: concurrent callers for the same stale account collapse into a single
//! `grant_type=refresh_token` exchange instead of racing the provider.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, AuditAction, AuditEntry, TokenUpdate},
	crypto::SecretString,
	exchange::{RefreshGrant, TokenExchange},
	lifecycle::TokenLifecycleManager,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Summary returned by [`TokenLifecycleManager::refresh`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshOutcome {
	/// Absolute expiration instant of the rotated access token.
	pub expires_at: OffsetDateTime,
	/// Validity window granted by the provider.
	pub expires_in: Duration,
	/// Refresh counter after this rotation.
	pub refresh_count: u64,
}

impl<X> TokenLifecycleManager<X>
where
	X: ?Sized + TokenExchange,
{
	/// Rotates the account's access token using the stored refresh token.
	///
	/// The stored refresh token is replaced only when the provider's response includes a new
	/// one; some providers never rotate it. Failures are audited and re-raised without retry.
	pub async fn refresh(&self, account: &AccountId) -> Result<RefreshOutcome> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::for_account(KIND, "refresh", account);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.metrics.record_refresh_attempt();

		let result = span
			.instrument(async move {
				// Resolve the account first; unknown identifiers must not allocate entries in
				// the singleflight map.
				self.load_active_account(account).await?;

				let guard = self.account_guard(account);
				let _singleflight = guard.lock().await;

				self.refresh_locked(account).await
			})
			.await;

		match &result {
			Ok(_) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
				self.metrics.record_refresh_success();
			},
			Err(_) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				self.metrics.record_refresh_failure();
			},
		}

		result
	}

	/// Returns the decrypted access token, refreshing first when the stored one is stale.
	///
	/// A record within [`refresh_buffer`](Self::refresh_buffer) of its expiry never reaches the
	/// caller; the refresh happens synchronously and its failure is this call's failure.
	pub async fn get_access_token(&self, account: &AccountId) -> Result<SecretString> {
		const KIND: FlowKind = FlowKind::AccessToken;

		let span = FlowSpan::for_account(KIND, "get_access_token", account);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut record = self.load_live_record(account).await?;

				if record.is_stale_at(OffsetDateTime::now_utc(), self.refresh_buffer) {
					let guard = self.account_guard(account);
					let _singleflight = guard.lock().await;

					// Re-check under the guard; a concurrent caller may have rotated already.
					record = self.load_live_record(account).await?;

					if record.is_stale_at(OffsetDateTime::now_utc(), self.refresh_buffer) {
						self.metrics.record_refresh_attempt();

						match self.refresh_locked(account).await {
							Ok(_) => self.metrics.record_refresh_success(),
							Err(e) => {
								self.metrics.record_refresh_failure();

								return Err(e);
							},
						}

						record = self.load_live_record(account).await?;
					}
				}

				Ok(self.cipher.open(&record.access_token)?)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Performs the rotation; callers must already hold the account's singleflight guard.
	async fn refresh_locked(&self, account: &AccountId) -> Result<RefreshOutcome> {
		let credential = self.load_active_account(account).await?;
		let record = self.load_live_record(account).await?;
		let client_secret = self.cipher.open(&credential.client_secret)?;
		let refresh_token = self.cipher.open(&record.refresh_token)?;
		let response = match self
			.exchange
			.exchange_refresh(RefreshGrant {
				client_id: &credential.client_id,
				client_secret: client_secret.expose(),
				refresh_token: refresh_token.expose(),
			})
			.await
		{
			Ok(response) => response,
			Err(e) => {
				self.record_audit(AuditEntry::failure(
					account.clone(),
					Some(record.id.clone()),
					AuditAction::Refreshed,
					e.to_string(),
				))
				.await;

				return Err(e.into());
			},
		};
		let expires_in = match response.validity() {
			Ok(expires_in) => expires_in,
			Err(e) => {
				self.record_audit(AuditEntry::failure(
					account.clone(),
					Some(record.id.clone()),
					AuditAction::Refreshed,
					e.to_string(),
				))
				.await;

				return Err(e.into());
			},
		};
		let refreshed_at = OffsetDateTime::now_utc();
		// The provider has already rotated its side at this point; a persistence failure still
		// leaves a trace in the audit trail.
		let persisted = async {
			let sealed_access = self.cipher.seal(&SecretString::new(&response.access_token))?;
			let sealed_refresh = response
				.refresh_token
				.as_deref()
				.map(|refresh_token| self.cipher.seal(&SecretString::new(refresh_token)))
				.transpose()?;

			self.tokens
				.update(account, TokenUpdate {
					access_token: sealed_access,
					refresh_token: sealed_refresh,
					expires_at: refreshed_at + expires_in,
					refresh_count: record.refresh_count + 1,
					refreshed_at,
				})
				.await?
				.ok_or_else(|| Error::TokenNotFound { account: account.clone() })
		}
		.await;
		let updated = match persisted {
			Ok(updated) => updated,
			Err(e) => {
				self.record_audit(AuditEntry::failure(
					account.clone(),
					Some(record.id.clone()),
					AuditAction::Refreshed,
					e.to_string(),
				))
				.await;

				return Err(e);
			},
		};

		self.record_audit(AuditEntry::success(
			account.clone(),
			updated.id.clone(),
			AuditAction::Refreshed,
		))
		.await;

		Ok(RefreshOutcome {
			expires_at: updated.expires_at,
			expires_in,
			refresh_count: updated.refresh_count,
		})
	}
}
