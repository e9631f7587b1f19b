//! Storage contracts and built-in backends for accounts, token records, and the audit trail.
//!
//! The lifecycle core only ever talks to these traits; the hosted relational store used in
//! production lives behind them in another crate. The upsert keyed on the account identifier is
//! what enforces the one-live-record-per-account invariant, and concurrent writers for the same
//! account resolve to last-writer-wins at this layer.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::{FailingAuditLog, MemoryStore};

// self
use crate::{
	_prelude::*,
	auth::{AccountCredential, AccountId, AuditEntry, TokenRecord, TokenUpdate},
};

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable record of OAuth client credentials per named account.
pub trait AccountStore
where
	Self: Send + Sync,
{
	/// Persists a freshly registered credential.
	fn insert(&self, credential: AccountCredential) -> StoreFuture<'_, ()>;

	/// Point lookup by account identifier.
	fn fetch<'a>(&'a self, account: &'a AccountId) -> StoreFuture<'a, Option<AccountCredential>>;

	/// Lists all active accounts.
	fn list_active(&self) -> StoreFuture<'_, Vec<AccountCredential>>;
}

/// Durable record of the current token pair per account.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Persists or atomically replaces the record for the owning account.
	///
	/// A second authenticate call for the same account replaces, never duplicates.
	fn upsert(&self, record: TokenRecord) -> StoreFuture<'_, TokenRecord>;

	/// Point lookup by account identifier.
	fn fetch<'a>(&'a self, account: &'a AccountId) -> StoreFuture<'a, Option<TokenRecord>>;

	/// Applies a field-level refresh update; returns the updated record, or `None` when no
	/// record exists for the account.
	fn update<'a>(
		&'a self,
		account: &'a AccountId,
		update: TokenUpdate,
	) -> StoreFuture<'a, Option<TokenRecord>>;

	/// Marks every record whose expiration lies at or before `now` as invalid; returns the
	/// number of records swept. Records expiring in the future are never touched.
	fn invalidate_expired(&self, now: OffsetDateTime) -> StoreFuture<'_, u64>;
}

/// Append-only history of authenticate/refresh attempts.
pub trait AuditLog
where
	Self: Send + Sync,
{
	/// Appends one entry; existing entries are never mutated or deleted.
	fn append(&self, entry: AuditEntry) -> StoreFuture<'_, ()>;
}

/// Error type produced by store implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
