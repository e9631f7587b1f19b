//! Fixtures shared by the integration suites.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::MockServer;
// self
use ads_token_broker::{
	auth::{AccountConfig, AccountId, TokenRecord},
	crypto::{AesGcmCipher, SecretCipher, SecretString},
	exchange::ReqwestExchange,
	lifecycle::TokenLifecycleManager,
	store::{AccountStore, AuditLog, MemoryStore, TokenStore},
	time::{Duration, OffsetDateTime},
	url::Url,
};

/// Manager type driven by every suite.
pub type TestManager = TokenLifecycleManager<ReqwestExchange>;

/// Path the token endpoint is mounted on.
pub const TOKEN_PATH: &str = "/auth/o2/token";

/// Deterministic cipher shared by the fixtures.
pub fn test_cipher() -> Arc<AesGcmCipher> {
	Arc::new(AesGcmCipher::from_key_bytes([7; 32]))
}

/// Endpoint URL for a running mock server.
pub fn token_endpoint(server: &MockServer) -> Url {
	Url::parse(&server.url(TOKEN_PATH)).expect("Mock token endpoint should parse.")
}

/// Endpoint placeholder for suites that never reach the network.
pub fn offline_endpoint() -> Url {
	Url::parse("https://localhost/auth/o2/token").expect("Placeholder token endpoint should parse.")
}

/// Manager with every collaborator swappable; suites substitute broken stores through this.
pub fn build_manager_with(
	accounts: Arc<dyn AccountStore>,
	tokens: Arc<dyn TokenStore>,
	audit: Arc<dyn AuditLog>,
	endpoint: Url,
) -> TestManager {
	TokenLifecycleManager::new(accounts, tokens, audit, test_cipher(), ReqwestExchange::new(endpoint))
}

/// Manager fully backed by one in-memory store, pointed at the mock server.
pub fn build_manager(server: &MockServer) -> (TestManager, Arc<MemoryStore>) {
	let backend = Arc::new(MemoryStore::default());
	let manager = build_manager_with(
		backend.clone(),
		backend.clone(),
		backend.clone(),
		token_endpoint(server),
	);

	(manager, backend)
}

/// Manager fully backed by one in-memory store, for suites that never reach the network.
pub fn build_offline_manager() -> (TestManager, Arc<MemoryStore>) {
	let backend = Arc::new(MemoryStore::default());
	let manager =
		build_manager_with(backend.clone(), backend.clone(), backend.clone(), offline_endpoint());

	(manager, backend)
}

/// Registers a throwaway account with fixture credentials.
pub async fn register_account(manager: &TestManager, name: &str) -> AccountId {
	let config =
		AccountConfig::new(name, "client-id", "client-secret", "https://localhost/callback")
			.expect("Account fixture should pass validation.");

	manager.ensure_account(config).await.expect("Account fixture should persist.").id
}

/// Seeds a token record directly into the backend, bypassing the exchange.
pub async fn seed_record(
	backend: &MemoryStore,
	cipher: &dyn SecretCipher,
	account: &AccountId,
	access: &str,
	refresh: &str,
	expires_in: Duration,
) -> TokenRecord {
	let record = TokenRecord::issue(
		account.clone(),
		cipher.seal(&SecretString::new(access)).expect("Sealing the access fixture should work."),
		cipher.seal(&SecretString::new(refresh)).expect("Sealing the refresh fixture should work."),
		"bearer",
		OffsetDateTime::now_utc(),
		expires_in,
	);

	backend.upsert(record.clone()).await.expect("Seeding the token record should work.");

	record
}
