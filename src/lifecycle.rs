//! Token lifecycle orchestration: registration, grant flows, status reads, and cleanup.
//!
//! [`TokenLifecycleManager`] is the only collaborator application code needs to hold. It owns
//! the store handles, the secret cipher, and the exchange client so the individual operations
//! can focus on grant-specific logic; it keeps no token state of its own.

pub mod authenticate;
pub mod refresh;

mod metrics;

pub use authenticate::*;
pub use metrics::LifecycleMetrics;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::{
		AccountConfig, AccountCredential, AccountId, AuditEntry, TokenRecord, TokenStatus,
		TokenStatusReport,
	},
	crypto::SecretCipher,
	exchange::TokenExchange,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{AccountStore, AuditLog, TokenStore},
};
#[cfg(feature = "reqwest")]
use crate::exchange::ReqwestExchange;

/// Staleness window applied when the caller does not override it.
pub const DEFAULT_REFRESH_BUFFER: Duration = Duration::seconds(300);

#[cfg(feature = "reqwest")]
/// Manager specialized for the crate's default reqwest exchange client.
pub type ReqwestLifecycleManager = TokenLifecycleManager<ReqwestExchange>;

/// Coordinates the token lifecycle for every registered advertising account.
///
/// Operations for different accounts never interfere. For one account, stores resolve
/// concurrent writes last-writer-wins, and the manager additionally holds a per-account
/// singleflight guard so concurrent stale reads collapse into a single refresh exchange.
pub struct TokenLifecycleManager<X>
where
	X: ?Sized + TokenExchange,
{
	/// Credential store consulted before every grant exchange.
	pub accounts: Arc<dyn AccountStore>,
	/// Token record store; its keyed upsert keeps one live record per account.
	pub tokens: Arc<dyn TokenStore>,
	/// Append-only attempt history. Append failures never fail the primary operation.
	pub audit: Arc<dyn AuditLog>,
	/// Cipher applied around every secret field read or write.
	pub cipher: Arc<dyn SecretCipher>,
	/// Client for the external token endpoint.
	pub exchange: Arc<X>,
	/// Staleness window: a record within this distance of expiry is refreshed before use.
	pub refresh_buffer: Duration,
	/// Shared counters for authenticate/refresh outcomes.
	pub metrics: Arc<LifecycleMetrics>,
	account_guards: Arc<Mutex<HashMap<AccountId, Arc<AsyncMutex<()>>>>>,
}
impl<X> TokenLifecycleManager<X>
where
	X: ?Sized + TokenExchange,
{
	/// Creates a manager with the default refresh buffer.
	pub fn new(
		accounts: Arc<dyn AccountStore>,
		tokens: Arc<dyn TokenStore>,
		audit: Arc<dyn AuditLog>,
		cipher: Arc<dyn SecretCipher>,
		exchange: impl Into<Arc<X>>,
	) -> Self {
		Self {
			accounts,
			tokens,
			audit,
			cipher,
			exchange: exchange.into(),
			refresh_buffer: DEFAULT_REFRESH_BUFFER,
			metrics: Default::default(),
			account_guards: Default::default(),
		}
	}

	/// Overrides the staleness window (defaults to 300 seconds); negative values clamp to zero.
	pub fn with_refresh_buffer(mut self, buffer: Duration) -> Self {
		self.refresh_buffer = if buffer.is_negative() { Duration::ZERO } else { buffer };

		self
	}

	/// Registers an advertising account, sealing its client secret before persistence.
	///
	/// Names are not checked for uniqueness; each call creates a distinct account.
	pub async fn ensure_account(&self, config: AccountConfig) -> Result<AccountCredential> {
		let client_secret = self.cipher.seal(&config.client_secret)?;
		let credential = AccountCredential {
			id: AccountId::generate(),
			name: config.name,
			client_id: config.client_id,
			client_secret,
			redirect_uri: config.redirect_uri,
			active: true,
			created_at: OffsetDateTime::now_utc(),
		};

		self.accounts.insert(credential.clone()).await?;

		Ok(credential)
	}

	/// Lists the active accounts, oldest registration first.
	pub async fn list_accounts(&self) -> Result<Vec<AccountCredential>> {
		Ok(self.accounts.list_active().await?)
	}

	/// Reports the token state for an account without ever triggering a refresh.
	///
	/// Store failures degrade to [`TokenStatus::Error`] so dashboards keep rendering while the
	/// backend is unhealthy.
	pub async fn token_status(&self, account: &AccountId) -> TokenStatus {
		match self.tokens.fetch(account).await {
			Ok(Some(record)) if record.is_valid => {
				let now = OffsetDateTime::now_utc();

				TokenStatus::Authenticated(TokenStatusReport {
					expires_at: record.expires_at,
					expires_in_seconds: record.remaining_seconds_at(now),
					needs_refresh: record.is_stale_at(now, self.refresh_buffer),
					refresh_count: record.refresh_count,
					last_refreshed: record.last_refreshed_at,
				})
			},
			Ok(_) => TokenStatus::NotAuthenticated,
			Err(e) => TokenStatus::Error { message: e.to_string() },
		}
	}

	/// Marks every record already past its expiry as invalid; returns the number swept.
	///
	/// This is the only path that clears `is_valid`. Records expiring in the future and the
	/// audit trail are never touched.
	pub async fn cleanup_expired(&self) -> Result<u64> {
		const KIND: FlowKind = FlowKind::Cleanup;

		let span = FlowSpan::new(KIND, "cleanup_expired");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				Ok(self.tokens.invalidate_expired(OffsetDateTime::now_utc()).await?)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	pub(crate) async fn load_active_account(
		&self,
		account: &AccountId,
	) -> Result<AccountCredential> {
		match self.accounts.fetch(account).await? {
			Some(credential) if credential.active => Ok(credential),
			_ => Err(Error::AccountNotFound { account: account.clone() }),
		}
	}

	pub(crate) async fn load_live_record(&self, account: &AccountId) -> Result<TokenRecord> {
		match self.tokens.fetch(account).await? {
			Some(record) if record.is_valid => Ok(record),
			_ => Err(Error::TokenNotFound { account: account.clone() }),
		}
	}

	pub(crate) async fn record_audit(&self, entry: AuditEntry) {
		if let Err(e) = self.audit.append(entry).await {
			obs::warn_audit_append_failed(&e);
		}
	}

	/// Returns (and creates on demand) the singleflight guard for an account.
	///
	/// Callers must resolve the account first; guard entries are only ever allocated for
	/// registered identifiers.
	pub(crate) fn account_guard(&self, account: &AccountId) -> Arc<AsyncMutex<()>> {
		let mut guards = self.account_guards.lock();

		guards.entry(account.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}

	#[cfg(test)]
	fn account_guard_count(&self) -> usize {
		self.account_guards.lock().len()
	}
}
impl<X> Clone for TokenLifecycleManager<X>
where
	X: ?Sized + TokenExchange,
{
	fn clone(&self) -> Self {
		Self {
			accounts: self.accounts.clone(),
			tokens: self.tokens.clone(),
			audit: self.audit.clone(),
			cipher: self.cipher.clone(),
			exchange: self.exchange.clone(),
			refresh_buffer: self.refresh_buffer,
			metrics: self.metrics.clone(),
			account_guards: self.account_guards.clone(),
		}
	}
}
impl<X> Debug for TokenLifecycleManager<X>
where
	X: ?Sized + TokenExchange,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenLifecycleManager")
			.field("refresh_buffer", &self.refresh_buffer)
			.finish()
	}
}
