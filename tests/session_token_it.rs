mod common;

// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use time::{Duration, OffsetDateTime};
// self
use common::{
	CLIENT_ID, CLIENT_SECRET, FailingStore, FakeStravaApi, Harness, RecordingPrompt, token,
	token_expiring_in,
};
use strava_hub::{
	config::IntegrationConfig,
	error::Error,
	session::{PROMPT_LINK_NAME, StravaSession, TokenState},
	store::MemoryStore,
};

#[tokio::test]
async fn fresh_token_is_never_refreshed() {
	let persisted = token_expiring_in("fresh", Duration::hours(2));
	let harness = Harness::with_persisted(persisted.clone());

	for _ in 0..3 {
		let state =
			harness.session.get_token().await.expect("Loading a fresh token should succeed.");

		assert_eq!(state, TokenState::Fresh);
		assert!(harness.session.is_token_valid());
	}

	assert_eq!(harness.api.count("refresh"), 0);
	assert_eq!(harness.session.token(), Some(persisted));
	assert_eq!(harness.api.current_access_token().as_deref(), Some("fresh"));
	assert_eq!(harness.store.saves(), 0);
}

#[tokio::test]
async fn token_inside_safety_margin_is_invalid_but_not_refreshed() {
	let harness = Harness::with_persisted(token_expiring_in("soon", Duration::seconds(120)));
	let state = harness.session.get_token().await.expect("Loading the token should succeed.");

	assert_eq!(state, TokenState::Fresh);
	assert!(harness.session.is_authorized());
	assert!(!harness.session.is_token_valid());
	assert_eq!(harness.api.count("refresh"), 0);
}

#[tokio::test]
async fn expired_persisted_token_is_refreshed_once_and_persisted() {
	let expired = token("stale", OffsetDateTime::now_utc() - Duration::seconds(10));
	let harness = Harness::with_persisted(expired);
	let state =
		harness.session.get_token().await.expect("Refreshing an expired token should succeed.");

	assert_eq!(state, TokenState::Refreshed);
	assert_eq!(harness.api.count("refresh"), 1);

	let issued = harness.api.last_issued().expect("The fake should have issued a token.");

	assert_eq!(harness.persisted().await, Some(issued.clone()));
	assert_eq!(harness.session.token(), Some(issued.clone()));
	assert_eq!(harness.api.current_access_token().as_deref(), Some(issued.access_token.expose()));
	assert!(issued.access_token.expose().ends_with("from-stale-refresh"));

	let state = harness.session.get_token().await.expect("The refreshed token should be reused.");

	assert_eq!(state, TokenState::Fresh);
	assert_eq!(harness.api.count("refresh"), 1);
	assert_eq!(harness.store.saves(), 1);
	assert_eq!(harness.session.metrics().refresh.successes(), 1);
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh() {
	let api = FakeStravaApi::default();

	api.delay_refresh(StdDuration::from_millis(20));

	let harness = Harness::new(
		api,
		MemoryStore::with_token(token("stale", OffsetDateTime::now_utc() - Duration::minutes(1))),
	);
	let (first, second, third) = tokio::join!(
		harness.session.get_token(),
		harness.session.get_token(),
		harness.session.get_token(),
	);
	let mut states = [first, second, third]
		.into_iter()
		.map(|state| state.expect("Concurrent token checks should succeed."))
		.collect::<Vec<_>>();

	states.sort_by_key(|state| *state == TokenState::Fresh);

	assert_eq!(states, [TokenState::Refreshed, TokenState::Fresh, TokenState::Fresh]);
	assert_eq!(harness.api.count("refresh"), 1);
}

#[tokio::test]
async fn failed_refresh_propagates_without_retry() {
	let harness =
		Harness::with_persisted(token("stale", OffsetDateTime::now_utc() - Duration::minutes(1)));

	harness.api.fail("refresh");

	let err = harness.session.get_token().await.expect_err("A rejected refresh must propagate.");

	assert!(matches!(err, Error::InvalidGrant { .. }));
	assert_eq!(harness.api.count("refresh"), 1);
	assert_eq!(harness.store.saves(), 0);
	assert_eq!(harness.session.metrics().refresh.failures(), 1);
}

#[tokio::test]
async fn refresh_without_token_is_not_authorized() {
	let harness = Harness::unauthorized();
	let err = harness.session.refresh_token().await.expect_err("Refreshing nothing must fail.");

	assert!(matches!(err, Error::NotAuthorized));
	assert_eq!(harness.api.count("refresh"), 0);
}

#[tokio::test]
async fn setup_without_persisted_token_requests_authorization_once() {
	let harness = Harness::unauthorized();

	harness.session.setup().await.expect("Setup should succeed without a token.");

	assert!(!harness.session.is_authorized());
	assert!(!harness.session.is_token_valid());

	let pending =
		harness.session.pending().expect("Setup should raise an authorization request.");
	let query = pending.authorize_url.query().expect("The authorization URL should carry a query.");

	assert!(query.contains("client_id=abc"));
	assert!(query.contains(&format!("state={}", pending.state)));

	harness.session.setup().await.expect("Repeated setup should succeed.");

	let again =
		harness.session.request_token().expect("Requesting again should reuse the prompt.");

	assert_eq!(again.state, pending.state);

	let requests = harness.prompt.requests();

	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].link_name, PROMPT_LINK_NAME);
	assert_eq!(requests[0].link_url, pending.authorize_url);
}

#[tokio::test]
async fn authorize_persists_exchanged_token_and_resolves_prompt() {
	let harness = Harness::unauthorized();

	harness.session.setup().await.expect("Setup should succeed without a token.");

	let pending = harness.session.pending().expect("Setup should raise an authorization request.");

	harness.session.authorize("CODE123").await.expect("Authorization should succeed.");

	let issued = harness.api.last_issued().expect("The fake should have issued a token.");

	assert!(harness.session.is_authorized());
	assert!(harness.session.is_token_valid());
	assert_eq!(harness.persisted().await, Some(issued.clone()));
	assert_eq!(harness.session.token(), Some(issued));
	assert_eq!(harness.api.exchanged_codes(), ["CODE123"]);
	assert_eq!(harness.prompt.resolved(), [pending.handle]);
	assert!(harness.session.pending().is_none());
	assert_eq!(harness.session.metrics().authorize.successes(), 1);
}

#[tokio::test]
async fn failed_authorization_keeps_the_prompt_open() {
	let harness = Harness::unauthorized();

	harness.session.setup().await.expect("Setup should succeed without a token.");
	harness.api.fail("exchange");

	let err = harness.session.authorize("bad-code").await.expect_err("A rejected code must fail.");

	assert!(matches!(err, Error::InvalidGrant { .. }));
	assert!(!harness.session.is_authorized());
	assert!(harness.session.pending().is_some());
	assert!(harness.prompt.resolved().is_empty());
	assert_eq!(harness.persisted().await, None);
	assert_eq!(harness.session.metrics().authorize.failures(), 1);
}

#[tokio::test]
async fn unsaved_authorization_leaves_the_session_unlinked() {
	let store = Arc::new(FailingStore::default());
	let prompt = Arc::new(RecordingPrompt::default());
	let session = StravaSession::new(
		IntegrationConfig::new(CLIENT_ID, CLIENT_SECRET),
		Arc::new(FakeStravaApi::default()),
		store.clone(),
		prompt.clone(),
	)
	.expect("Session should build from a valid configuration.");

	session.setup().await.expect("Setup should raise an authorization request.");

	let err = session.authorize("CODE123").await.expect_err("A failed save must fail linking.");

	assert!(matches!(err, Error::Storage(_)));
	assert_eq!(store.attempts(), 1);
	assert!(!session.is_authorized());
	assert!(session.token().is_none());
	assert!(session.pending().is_some());
	assert!(prompt.resolved().is_empty());
	assert_eq!(session.metrics().authorize.failures(), 1);
}

#[tokio::test]
async fn callback_state_is_checked_against_the_pending_request() {
	let harness = Harness::unauthorized();

	assert!(harness.session.validate_state("anything").is_ok());

	let pending = harness.session.request_token().expect("Requesting a token should succeed.");

	assert!(harness.session.validate_state(&pending.state).is_ok());
	assert!(matches!(
		harness.session.validate_state("forged"),
		Err(Error::InvalidGrant { .. })
	));
}
