#![cfg(feature = "reqwest")]

mod common;

// crates.io
use httpmock::prelude::*;
// self
use ads_token_broker::{
	auth::{AccountId, AuditAction},
	error::Error,
	exchange::ExchangeError,
	time::Duration,
};
use common::*;

#[tokio::test]
async fn authenticate_stores_sealed_tokens_and_audits() {
	let server = MockServer::start_async().await;
	let (manager, backend) = build_manager(&server);
	let account = register_account(&manager, "ads-main").await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH).body_includes("grant_type=authorization_code");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-initial\",\"refresh_token\":\"refresh-initial\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let outcome = manager
		.authenticate(&account, "one-time-code")
		.await
		.expect("Code exchange against the mock endpoint should succeed.");

	mock.assert_async().await;

	assert_eq!(outcome.expires_in, Duration::seconds(3600));

	let record = backend.token_record(&account).expect("A token record should exist.");

	assert!(record.is_valid);
	assert_eq!(record.refresh_count, 0);
	assert_ne!(record.access_token.encoded(), "access-initial");
	assert_eq!(
		manager
			.cipher
			.open(&record.access_token)
			.expect("Stored access token should decrypt with the manager's cipher.")
			.expose(),
		"access-initial",
	);

	let audit = backend.audit_entries();

	assert_eq!(audit.len(), 1);
	assert_eq!(audit[0].action, AuditAction::Created);
	assert!(audit[0].success);
	assert_eq!(audit[0].token, Some(record.id));
}

#[tokio::test]
async fn second_authenticate_replaces_the_record() {
	let server = MockServer::start_async().await;
	let (manager, backend) = build_manager(&server);
	let account = register_account(&manager, "ads-main").await;

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-1\",\"refresh_token\":\"refresh-1\",\"expires_in\":3600}",
			);
		})
		.await;

	let first = manager
		.authenticate(&account, "code-1")
		.await
		.expect("First code exchange should succeed.");
	let second = manager
		.authenticate(&account, "code-2")
		.await
		.expect("Second code exchange should succeed.");

	assert_ne!(first.token_id, second.token_id);
	assert_eq!(backend.token_record_count(), 1);

	let record = backend.token_record(&account).expect("The replacement record should exist.");

	assert_eq!(record.id, second.token_id);
	assert_eq!(record.refresh_count, 0);
	assert_eq!(backend.audit_entries().len(), 2);
}

#[tokio::test]
async fn rejected_code_grant_is_audited_and_propagated() {
	let server = MockServer::start_async().await;
	let (manager, backend) = build_manager(&server);
	let account = register_account(&manager, "ads-main").await;

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;

	let err = manager
		.authenticate(&account, "expired-code")
		.await
		.expect_err("A rejected code grant should fail.");

	assert!(matches!(err, Error::Exchange(ExchangeError::Rejected { status: 400, .. })));
	assert!(backend.token_record(&account).is_none());

	let audit = backend.audit_entries();

	assert_eq!(audit.len(), 1);
	assert_eq!(audit[0].action, AuditAction::Created);
	assert!(!audit[0].success);
	assert!(audit[0].token.is_none());
	assert!(
		audit[0]
			.error_message
			.as_deref()
			.expect("A failed entry should carry a message.")
			.contains("400"),
	);
	assert_eq!(manager.metrics.authenticate_failures(), 1);
}

#[tokio::test]
async fn oversized_expiry_is_rejected_and_audited() {
	let server = MockServer::start_async().await;
	let (manager, backend) = build_manager(&server);
	let account = register_account(&manager, "ads-main").await;

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-1\",\"refresh_token\":\"refresh-1\",\"expires_in\":9223372036854775807}",
			);
		})
		.await;

	let err = manager
		.authenticate(&account, "one-time-code")
		.await
		.expect_err("An absurd validity window should be rejected, not applied.");

	assert!(matches!(
		err,
		Error::Exchange(ExchangeError::ExpiresInOutOfRange { value: i64::MAX }),
	));
	assert!(backend.token_record(&account).is_none());

	let audit = backend.audit_entries();

	assert_eq!(audit.len(), 1);
	assert_eq!(audit[0].action, AuditAction::Created);
	assert!(!audit[0].success);
}

#[tokio::test]
async fn unknown_account_never_reaches_the_endpoint() {
	let server = MockServer::start_async().await;
	let (manager, _backend) = build_manager(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200);
		})
		.await;
	let ghost = AccountId::new("acct-ghost").expect("Account fixture should be valid.");
	let err = manager
		.authenticate(&ghost, "code")
		.await
		.expect_err("Authenticating an unregistered account should fail.");

	assert!(err.is_not_found());
	assert!(matches!(err, Error::AccountNotFound { .. }));
	mock.assert_calls_async(0).await;
}
