#![allow(dead_code)]

// std
use std::{
	collections::HashSet,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime};
// self
use strava_hub::{
	api::{ApiFuture, StravaApi},
	auth::{AthleteId, ClubId, GearId, Token, TokenSecret},
	config::IntegrationConfig,
	error::Error,
	model::{Activity, ActivitySummary, Athlete, AthleteStats, Club, Gear},
	session::{AuthorizationPrompt, PromptHandle, PromptRequest, StravaSession},
	store::{MemoryStore, StoreError, StoreFuture, TokenStore},
};

pub const CLIENT_ID: &str = "abc";
pub const CLIENT_SECRET: &str = "xyz";

pub fn token(access: &str, expires_at: OffsetDateTime) -> Token {
	Token::builder()
		.access_token(access)
		.refresh_token(format!("{access}-refresh"))
		.expires_at(expires_at)
		.build()
		.expect("Token fixture should build.")
}

pub fn token_expiring_in(access: &str, delta: Duration) -> Token {
	token(access, OffsetDateTime::now_utc() + delta)
}

/// Operation names understood by [`FakeStravaApi::fail`].
pub const OPS: [&str; 8] =
	["exchange", "refresh", "athlete", "stats", "activities", "activity", "gear", "club"];

/// Scriptable in-memory stand-in for Strava.
#[derive(Default)]
pub struct FakeStravaApi {
	calls: Mutex<Vec<&'static str>>,
	counters: [AtomicUsize; 8],
	failing: Mutex<HashSet<&'static str>>,
	activities: Mutex<Vec<ActivitySummary>>,
	access_token: Mutex<Option<TokenSecret>>,
	seen_tokens: Mutex<Vec<(&'static str, Option<String>)>>,
	issued: Mutex<Vec<Token>>,
	exchanged_codes: Mutex<Vec<String>>,
	refresh_delay: Mutex<Option<StdDuration>>,
}
impl FakeStravaApi {
	pub fn with_activities(activities: Vec<ActivitySummary>) -> Self {
		let api = Self::default();

		*api.activities.lock() = activities;

		api
	}

	pub fn fail(&self, op: &'static str) {
		self.failing.lock().insert(op);
	}

	pub fn heal(&self, op: &'static str) {
		self.failing.lock().remove(op);
	}

	pub fn delay_refresh(&self, delay: StdDuration) {
		*self.refresh_delay.lock() = Some(delay);
	}

	pub fn count(&self, op: &str) -> usize {
		OPS.iter()
			.position(|candidate| *candidate == op)
			.map(|index| self.counters[index].load(Ordering::SeqCst))
			.unwrap_or_default()
	}

	pub fn fetches(&self) -> usize {
		["athlete", "stats", "activities", "activity", "gear", "club"]
			.iter()
			.map(|op| self.count(op))
			.sum()
	}

	pub fn last_issued(&self) -> Option<Token> {
		self.issued.lock().last().cloned()
	}

	pub fn exchanged_codes(&self) -> Vec<String> {
		self.exchanged_codes.lock().clone()
	}

	pub fn current_access_token(&self) -> Option<String> {
		self.access_token.lock().as_ref().map(|secret| secret.expose().to_owned())
	}

	/// Bearer token installed when each fetch ran.
	pub fn seen_tokens(&self) -> Vec<(&'static str, Option<String>)> {
		self.seen_tokens.lock().clone()
	}

	fn enter(&self, op: &'static str) -> Result<(), Error> {
		if let Some(index) = OPS.iter().position(|candidate| *candidate == op) {
			self.counters[index].fetch_add(1, Ordering::SeqCst);
		}

		self.calls.lock().push(op);

		if !matches!(op, "exchange" | "refresh") {
			let current = self.current_access_token();

			self.seen_tokens.lock().push((op, current));
		}
		if self.failing.lock().contains(op) {
			return Err(match op {
				"exchange" | "refresh" =>
					Error::InvalidGrant { reason: format!("{op} rejected by fake") },
				_ => Error::Api {
					endpoint: format!("/{op}"),
					status: 500,
					message: "Internal Server Error".into(),
				},
			});
		}

		Ok(())
	}

	fn issue(&self, access: String) -> Token {
		let token = token_expiring_in(&access, Duration::hours(6));

		self.issued.lock().push(token.clone());

		token
	}
}
impl StravaApi for FakeStravaApi {
	fn exchange_code<'a>(&'a self, code: &'a str) -> ApiFuture<'a, Token> {
		Box::pin(async move {
			self.exchanged_codes.lock().push(code.to_owned());
			self.enter("exchange")?;

			Ok(self.issue(format!("exchanged-{code}")))
		})
	}

	fn refresh_access_token<'a>(&'a self, refresh_token: &'a TokenSecret) -> ApiFuture<'a, Token> {
		Box::pin(async move {
			self.enter("refresh")?;

			let delay = *self.refresh_delay.lock();

			if let Some(delay) = delay {
				tokio::time::sleep(delay).await;
			}

			let round = self.count("refresh");

			Ok(self.issue(format!("refreshed-{round}-from-{}", refresh_token.expose())))
		})
	}

	fn set_access_token(&self, token: Option<TokenSecret>) {
		*self.access_token.lock() = token;
	}

	fn athlete<'a>(&'a self, id: &'a AthleteId) -> ApiFuture<'a, Athlete> {
		Box::pin(async move {
			self.enter("athlete")?;

			Ok(Athlete {
				id: id.parse().unwrap_or_default(),
				firstname: Some("Fake".into()),
				lastname: Some("Athlete".into()),
				..Default::default()
			})
		})
	}

	fn athlete_stats<'a>(&'a self, _id: &'a AthleteId) -> ApiFuture<'a, AthleteStats> {
		Box::pin(async move {
			self.enter("stats")?;

			let mut stats = AthleteStats::default();

			stats.ytd_run_totals.count = 7;

			Ok(stats)
		})
	}

	fn activities(&self, _page: u32, per_page: u32) -> ApiFuture<'_, Vec<ActivitySummary>> {
		Box::pin(async move {
			self.enter("activities")?;

			Ok(self.activities.lock().iter().take(per_page as usize).cloned().collect())
		})
	}

	fn activity(&self, id: u64, _include_all_efforts: bool) -> ApiFuture<'_, Activity> {
		Box::pin(async move {
			self.enter("activity")?;

			let summary = self
				.activities
				.lock()
				.iter()
				.find(|summary| summary.id == id)
				.cloned()
				.unwrap_or_else(|| ActivitySummary { id, ..Default::default() });

			Ok(Activity { summary, calories: Some(512.0), ..Default::default() })
		})
	}

	fn gear<'a>(&'a self, id: &'a GearId) -> ApiFuture<'a, Gear> {
		Box::pin(async move {
			self.enter("gear")?;

			Ok(Gear { id: id.to_string(), name: Some("Fake bike".into()), ..Default::default() })
		})
	}

	fn club<'a>(&'a self, id: &'a ClubId) -> ApiFuture<'a, Club> {
		Box::pin(async move {
			self.enter("club")?;

			Ok(Club {
				id: id.parse().unwrap_or_default(),
				name: "Fake club".into(),
				..Default::default()
			})
		})
	}
}

/// Prompt facility recording every request and resolution.
#[derive(Default)]
pub struct RecordingPrompt {
	requests: Mutex<Vec<PromptRequest>>,
	resolved: Mutex<Vec<PromptHandle>>,
}
impl RecordingPrompt {
	pub fn requests(&self) -> Vec<PromptRequest> {
		self.requests.lock().clone()
	}

	pub fn resolved(&self) -> Vec<PromptHandle> {
		self.resolved.lock().clone()
	}
}
impl AuthorizationPrompt for RecordingPrompt {
	fn request(&self, request: &PromptRequest) -> PromptHandle {
		let mut requests = self.requests.lock();

		requests.push(request.clone());

		PromptHandle::new(format!("prompt-{}", requests.len()))
	}

	fn done(&self, handle: &PromptHandle) {
		self.resolved.lock().push(handle.clone());
	}
}

/// Store whose writes always fail, as on a full disk.
#[derive(Default)]
pub struct FailingStore {
	saves: AtomicUsize,
}
impl FailingStore {
	pub fn attempts(&self) -> usize {
		self.saves.load(Ordering::SeqCst)
	}
}
impl TokenStore for FailingStore {
	fn save(&self, _token: Token) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.saves.fetch_add(1, Ordering::SeqCst);

			Err::<(), _>(StoreError::Backend { message: "disk full".into() })
		})
	}

	fn load(&self) -> StoreFuture<'_, Option<Token>> {
		Box::pin(async { Ok::<_, StoreError>(None) })
	}
}

pub struct Harness {
	pub session: Arc<StravaSession>,
	pub api: Arc<FakeStravaApi>,
	pub store: MemoryStore,
	pub prompt: Arc<RecordingPrompt>,
}
impl Harness {
	pub fn new(api: FakeStravaApi, store: MemoryStore) -> Self {
		let api = Arc::new(api);
		let prompt = Arc::new(RecordingPrompt::default());
		let session = StravaSession::new(
			IntegrationConfig::new(CLIENT_ID, CLIENT_SECRET),
			api.clone(),
			Arc::new(store.clone()),
			prompt.clone(),
		)
		.expect("Session should build from a valid configuration.");

		Self { session: Arc::new(session), api, store, prompt }
	}

	pub fn unauthorized() -> Self {
		Self::new(FakeStravaApi::default(), MemoryStore::default())
	}

	pub fn with_persisted(token: Token) -> Self {
		Self::new(FakeStravaApi::default(), MemoryStore::with_token(token))
	}

	pub async fn persisted(&self) -> Option<Token> {
		self.store.load().await.expect("Memory store load should succeed.")
	}
}
