//! Thread-safe in-memory store implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{AccountCredential, AccountId, AuditEntry, TokenRecord, TokenUpdate},
	store::{AccountStore, AuditLog, StoreError, StoreFuture, TokenStore},
};

type AccountMap = Arc<RwLock<HashMap<AccountId, AccountCredential>>>;
type TokenMap = Arc<RwLock<HashMap<AccountId, TokenRecord>>>;
type AuditVec = Arc<RwLock<Vec<AuditEntry>>>;

/// In-process backend implementing all three store contracts for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	accounts: AccountMap,
	tokens: TokenMap,
	audit: AuditVec,
}
impl MemoryStore {
	/// Returns a snapshot of the audit trail, oldest first.
	pub fn audit_entries(&self) -> Vec<AuditEntry> {
		self.audit.read().clone()
	}

	/// Returns the stored token record for an account, valid or not.
	pub fn token_record(&self, account: &AccountId) -> Option<TokenRecord> {
		self.tokens.read().get(account).cloned()
	}

	/// Returns the number of stored token records.
	pub fn token_record_count(&self) -> usize {
		self.tokens.read().len()
	}

	fn upsert_now(map: TokenMap, record: TokenRecord) -> TokenRecord {
		map.write().insert(record.account.clone(), record.clone());

		record
	}

	fn update_now(map: TokenMap, account: AccountId, update: TokenUpdate) -> Option<TokenRecord> {
		let mut guard = map.write();

		match guard.get_mut(&account) {
			Some(record) => {
				record.apply(update);

				Some(record.clone())
			},
			None => None,
		}
	}

	fn invalidate_now(map: TokenMap, now: OffsetDateTime) -> u64 {
		let mut guard = map.write();
		let mut swept = 0;

		for record in guard.values_mut() {
			if record.is_valid && record.expires_at <= now {
				record.is_valid = false;
				swept += 1;
			}
		}

		swept
	}
}
impl AccountStore for MemoryStore {
	fn insert(&self, credential: AccountCredential) -> StoreFuture<'_, ()> {
		let map = self.accounts.clone();

		Box::pin(async move {
			map.write().insert(credential.id.clone(), credential);

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, account: &'a AccountId) -> StoreFuture<'a, Option<AccountCredential>> {
		let map = self.accounts.clone();
		let account = account.to_owned();

		Box::pin(async move { Ok(map.read().get(&account).cloned()) })
	}

	fn list_active(&self) -> StoreFuture<'_, Vec<AccountCredential>> {
		let map = self.accounts.clone();

		Box::pin(async move {
			let mut active: Vec<_> =
				map.read().values().filter(|credential| credential.active).cloned().collect();

			active.sort_by(|a, b| a.created_at.cmp(&b.created_at));

			Ok(active)
		})
	}
}
impl TokenStore for MemoryStore {
	fn upsert(&self, record: TokenRecord) -> StoreFuture<'_, TokenRecord> {
		let map = self.tokens.clone();

		Box::pin(async move { Ok(Self::upsert_now(map, record)) })
	}

	fn fetch<'a>(&'a self, account: &'a AccountId) -> StoreFuture<'a, Option<TokenRecord>> {
		let map = self.tokens.clone();
		let account = account.to_owned();

		Box::pin(async move { Ok(map.read().get(&account).cloned()) })
	}

	fn update<'a>(
		&'a self,
		account: &'a AccountId,
		update: TokenUpdate,
	) -> StoreFuture<'a, Option<TokenRecord>> {
		let map = self.tokens.clone();
		let account = account.to_owned();

		Box::pin(async move { Ok(Self::update_now(map, account, update)) })
	}

	fn invalidate_expired(&self, now: OffsetDateTime) -> StoreFuture<'_, u64> {
		let map = self.tokens.clone();

		Box::pin(async move { Ok(Self::invalidate_now(map, now)) })
	}
}
impl AuditLog for MemoryStore {
	fn append(&self, entry: AuditEntry) -> StoreFuture<'_, ()> {
		let log = self.audit.clone();

		Box::pin(async move {
			log.write().push(entry);

			Ok(())
		})
	}
}

/// [`AuditLog`] decorator that always fails; used to exercise audit-append resilience.
#[derive(Clone, Debug, Default)]
pub struct FailingAuditLog;
impl AuditLog for FailingAuditLog {
	fn append(&self, _entry: AuditEntry) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			Err(StoreError::Backend { message: "audit log unavailable".into() })
		})
	}
}
