//! Simple file-backed store for lightweight single-node deployments.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{AccountCredential, AccountId, AuditEntry, TokenRecord, TokenUpdate},
	store::{AccountStore, AuditLog, StoreError, StoreFuture, TokenStore},
};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Snapshot {
	accounts: HashMap<AccountId, AccountCredential>,
	tokens: HashMap<AccountId, TokenRecord>,
	audit: Vec<AuditEntry>,
}

/// Persists accounts, token records, and the audit trail to one JSON file after each mutation.
///
/// Secret fields inside the snapshot stay sealed; the file never contains plaintext tokens.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Snapshot>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = if path.exists() { Self::load_snapshot(&path)? } else { Snapshot::default() };

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(Snapshot::default());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}
		Ok(())
	}

	fn persist_locked(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl AccountStore for FileStore {
	fn insert(&self, credential: AccountCredential) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			guard.accounts.insert(credential.id.clone(), credential);
			self.persist_locked(&guard)?;

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, account: &'a AccountId) -> StoreFuture<'a, Option<AccountCredential>> {
		Box::pin(async move { Ok(self.inner.read().accounts.get(account).cloned()) })
	}

	fn list_active(&self) -> StoreFuture<'_, Vec<AccountCredential>> {
		Box::pin(async move {
			let mut active: Vec<_> = self
				.inner
				.read()
				.accounts
				.values()
				.filter(|credential| credential.active)
				.cloned()
				.collect();

			active.sort_by(|a, b| a.created_at.cmp(&b.created_at));

			Ok(active)
		})
	}
}
impl TokenStore for FileStore {
	fn upsert(&self, record: TokenRecord) -> StoreFuture<'_, TokenRecord> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			guard.tokens.insert(record.account.clone(), record.clone());
			self.persist_locked(&guard)?;

			Ok(record)
		})
	}

	fn fetch<'a>(&'a self, account: &'a AccountId) -> StoreFuture<'a, Option<TokenRecord>> {
		Box::pin(async move { Ok(self.inner.read().tokens.get(account).cloned()) })
	}

	fn update<'a>(
		&'a self,
		account: &'a AccountId,
		update: TokenUpdate,
	) -> StoreFuture<'a, Option<TokenRecord>> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let updated = match guard.tokens.get_mut(account) {
				Some(record) => {
					record.apply(update);

					Some(record.clone())
				},
				None => None,
			};

			if updated.is_some() {
				self.persist_locked(&guard)?;
			}

			Ok(updated)
		})
	}

	fn invalidate_expired(&self, now: OffsetDateTime) -> StoreFuture<'_, u64> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let mut swept = 0;

			for record in guard.tokens.values_mut() {
				if record.is_valid && record.expires_at <= now {
					record.is_valid = false;
					swept += 1;
				}
			}

			if swept > 0 {
				self.persist_locked(&guard)?;
			}

			Ok(swept)
		})
	}
}
impl AuditLog for FileStore {
	fn append(&self, entry: AuditEntry) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			guard.audit.push(entry);
			self.persist_locked(&guard)?;

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::{
		auth::{AuditAction, TokenId},
		crypto::Sealed,
	};

	fn temp_path() -> PathBuf {
		let unique = format!(
			"ads_token_broker_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn build_record(account: &AccountId) -> TokenRecord {
		TokenRecord::issue(
			account.clone(),
			Sealed::from_encoded("access-blob"),
			Sealed::from_encoded("refresh-blob"),
			"bearer",
			OffsetDateTime::now_utc(),
			Duration::hours(1),
		)
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let account = AccountId::new("acct-file").expect("Account fixture should be valid.");
		let record = build_record(&account);
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(TokenStore::upsert(&store, record.clone()))
			.expect("Failed to save fixture record to file store.");
		rt.block_on(AuditLog::append(
			&store,
			AuditEntry::success(account.clone(), TokenId::generate(), AuditAction::Created),
		))
		.expect("Failed to append audit fixture to file store.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(TokenStore::fetch(&reopened, &account))
			.expect("Failed to fetch fixture record from file store.")
			.expect("File store lost record after reopen.");

		assert_eq!(fetched.access_token, record.access_token);
		assert_eq!(fetched.id, record.id);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn invalidation_persists_across_reopen() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let account = AccountId::new("acct-sweep").expect("Account fixture should be valid.");
		let mut record = build_record(&account);

		record.expires_at = OffsetDateTime::now_utc() - Duration::minutes(1);

		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(TokenStore::upsert(&store, record))
			.expect("Failed to save expired record to file store.");

		let swept = rt
			.block_on(store.invalidate_expired(OffsetDateTime::now_utc()))
			.expect("Sweep should succeed.");

		assert_eq!(swept, 1);
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(TokenStore::fetch(&reopened, &account))
			.expect("Failed to fetch swept record from file store.")
			.expect("Swept record should remain present.");

		assert!(!fetched.is_valid);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}
