//! Account session: the single owner of authorization state and gate for every Strava call.
//!
//! A session holds at most one [`Token`], the [`StravaApi`] adapter, the [`TokenStore`], and
//! keyed registries of resource holders. Token loading, refreshing, and code exchanges are
//! serialized by one async mutex so near-simultaneous updates never refresh twice.

mod metrics;
pub mod pending;

pub use metrics::*;
pub use pending::*;

// self
use crate::{
	_prelude::*,
	api::{StravaApi, StravaClient},
	auth::{AthleteId, ClubId, GearId, Token},
	config::IntegrationConfig,
	data::{AthleteData, ClubData, GearData},
	http::ReqwestHttpClient,
	oauth,
	obs::{self, OperationKind},
	store::TokenStore,
};

/// What [`StravaSession::get_token`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenState {
	/// A token is held and has not expired.
	Fresh,
	/// The held token had expired and was refreshed.
	Refreshed,
	/// No token exists; the user has been asked to authorize.
	AuthorizationPending,
}

/// Strava account session.
pub struct StravaSession {
	config: IntegrationConfig,
	api: Arc<dyn StravaApi>,
	store: Arc<dyn TokenStore>,
	prompt: Arc<dyn AuthorizationPrompt>,
	token: RwLock<Option<Token>>,
	token_gate: AsyncMutex<()>,
	pending: Mutex<Option<PendingAuthorization>>,
	athletes: Mutex<HashMap<AthleteId, Arc<AthleteData>>>,
	gears: Mutex<HashMap<GearId, Arc<GearData>>>,
	clubs: Mutex<HashMap<ClubId, Arc<ClubData>>>,
	metrics: SessionMetrics,
}
impl StravaSession {
	/// Creates a session from explicit collaborators.
	pub fn new(
		config: IntegrationConfig,
		api: Arc<dyn StravaApi>,
		store: Arc<dyn TokenStore>,
		prompt: Arc<dyn AuthorizationPrompt>,
	) -> Result<Self> {
		config.validate()?;

		Ok(Self {
			config,
			api,
			store,
			prompt,
			token: RwLock::new(None),
			token_gate: AsyncMutex::new(()),
			pending: Mutex::new(None),
			athletes: Default::default(),
			gears: Default::default(),
			clubs: Default::default(),
			metrics: SessionMetrics::default(),
		})
	}

	/// Creates a session talking to Strava through reqwest.
	pub fn with_reqwest(
		config: IntegrationConfig,
		http: ReqwestHttpClient,
		store: Arc<dyn TokenStore>,
		prompt: Arc<dyn AuthorizationPrompt>,
	) -> Result<Self> {
		let api = StravaClient::with_http_client(config.clone(), http)?;

		Self::new(config, Arc::new(api), store, prompt)
	}

	/// Configuration the session was built with.
	pub fn config(&self) -> &IntegrationConfig {
		&self.config
	}

	/// Adapter used for Strava calls.
	pub fn api(&self) -> &dyn StravaApi {
		self.api.as_ref()
	}

	/// Token operation counters.
	pub fn metrics(&self) -> &SessionMetrics {
		&self.metrics
	}

	/// Clone of the held token, if any.
	pub fn token(&self) -> Option<Token> {
		self.token.read().clone()
	}

	/// Outstanding authorization request, if any.
	pub fn pending(&self) -> Option<PendingAuthorization> {
		self.pending.lock().clone()
	}

	/// Returns `true` iff a token is held, regardless of expiry.
	pub fn is_authorized(&self) -> bool {
		self.token.read().is_some()
	}

	/// Returns `true` iff a token is held and outlives the safety margin.
	pub fn is_token_valid(&self) -> bool {
		self.is_token_valid_at(OffsetDateTime::now_utc())
	}

	/// [`StravaSession::is_token_valid`] evaluated at `now`.
	pub fn is_token_valid_at(&self, now: OffsetDateTime) -> bool {
		match self.token.read().as_ref() {
			Some(token) if token.is_valid_at(now) => true,
			Some(token) => {
				tracing::info!(expires_at = %token.expires_at, "Strava token is not valid.");

				false
			},
			None => {
				tracing::info!("Strava account is not authorized.");

				false
			},
		}
	}

	/// Ensures the session holds a usable token.
	///
	/// Loads a persisted token when none is held, requests authorization when nothing is
	/// persisted, and refreshes a token whose expiry has passed. Must be awaited before any
	/// fetch.
	pub async fn get_token(&self) -> Result<TokenState> {
		let _gate = self.token_gate.lock().await;

		if !self.is_authorized() {
			match self.store.load().await? {
				Some(token) => {
					tracing::info!(expires_at = %token.expires_at, "Loaded persisted Strava token.");

					self.install(token);
				},
				None => {
					self.request_token()?;

					return Ok(TokenState::AuthorizationPending);
				},
			}
		}

		let expired = self.token.read().as_ref().is_some_and(Token::is_expired);

		if expired {
			self.refresh_locked().await?;

			return Ok(TokenState::Refreshed);
		}

		Ok(TokenState::Fresh)
	}

	/// Like [`StravaSession::get_token`], but fails with [`Error::NotAuthorized`] when no token
	/// is held afterwards.
	pub async fn require_token(&self) -> Result<()> {
		match self.get_token().await? {
			TokenState::AuthorizationPending => Err(Error::NotAuthorized),
			TokenState::Fresh | TokenState::Refreshed => Ok(()),
		}
	}

	/// Exchanges an authorization code, persists the token, and resolves the pending prompt.
	///
	/// Concludes by re-running [`StravaSession::setup`].
	pub async fn authorize(&self, code: &str) -> Result<()> {
		{
			let _gate = self.token_gate.lock().await;

			self.metrics.authorize.record_attempt();

			let result = obs::observe(OperationKind::Authorize, "exchange_code", async {
				let token = self.api.exchange_code(code).await?;

				// Only a persisted token counts as linked; the prompt stays open otherwise.
				self.store.save(token.clone()).await?;
				self.install(token);

				Ok(())
			})
			.await;

			match result {
				Ok(()) => self.metrics.authorize.record_success(),
				Err(e) => {
					self.metrics.authorize.record_failure();

					return Err(e);
				},
			}

			let pending = self.pending.lock().take();

			if let Some(pending) = pending {
				self.prompt.done(&pending.handle);
			}

			tracing::info!("Strava account authorized.");
		}

		self.setup().await
	}

	/// Raises an authorization prompt, reusing the outstanding one if present.
	pub fn request_token(&self) -> Result<PendingAuthorization> {
		let mut slot = self.pending.lock();

		if let Some(existing) = slot.as_ref() {
			return Ok(existing.clone());
		}

		let redirect = self.config.callback_url()?;
		let state = oauth::generate_state();
		let authorize_url = oauth::authorize_url(&self.config, &redirect, &state);
		let handle = self.prompt.request(&PromptRequest::authorization(authorize_url.clone()));
		let pending = PendingAuthorization::new(authorize_url, state, handle);

		tracing::info!(prompt = %pending.handle, "Requested Strava authorization.");

		*slot = Some(pending.clone());

		Ok(pending)
	}

	/// Exchanges the held refresh token for a new token and persists it. No retries.
	pub async fn refresh_token(&self) -> Result<Token> {
		let _gate = self.token_gate.lock().await;

		self.refresh_locked().await
	}

	/// Checks a callback's `state` against the outstanding authorization.
	///
	/// Without an outstanding request (e.g., after a restart) any state is accepted.
	pub fn validate_state(&self, state: &str) -> Result<()> {
		match self.pending.lock().as_ref() {
			Some(pending) => pending.validate_state(state),
			None => Ok(()),
		}
	}

	/// Loads or requests a token when unauthorized. Idempotent.
	pub async fn setup(&self) -> Result<()> {
		if !self.is_authorized() {
			self.get_token().await?;
		}

		Ok(())
	}

	/// Returns the athlete holder for `id`, creating it on first use.
	pub fn get_athlete(&self, id: &AthleteId) -> Arc<AthleteData> {
		self.athletes
			.lock()
			.entry(id.clone())
			.or_insert_with(|| Arc::new(AthleteData::new(id.clone())))
			.clone()
	}

	/// Returns the gear holder for `id`, creating it on first use.
	pub fn get_gear(&self, id: &GearId) -> Arc<GearData> {
		self.gears
			.lock()
			.entry(id.clone())
			.or_insert_with(|| Arc::new(GearData::new(id.clone())))
			.clone()
	}

	/// Returns the club holder for `id`, creating it on first use.
	pub fn get_club(&self, id: &ClubId) -> Arc<ClubData> {
		self.clubs
			.lock()
			.entry(id.clone())
			.or_insert_with(|| Arc::new(ClubData::new(id.clone())))
			.clone()
	}

	// Caller must hold `token_gate`.
	async fn refresh_locked(&self) -> Result<Token> {
		let refresh_token = self
			.token
			.read()
			.as_ref()
			.map(|token| token.refresh_token.clone())
			.ok_or(Error::NotAuthorized)?;

		self.metrics.refresh.record_attempt();

		let result = obs::observe(OperationKind::Refresh, "refresh_token", async {
			let token = self.api.refresh_access_token(&refresh_token).await?;

			self.install(token.clone());
			self.store.save(token.clone()).await?;

			Ok(token)
		})
		.await;

		match result {
			Ok(token) => {
				self.metrics.refresh.record_success();

				tracing::info!(expires_at = %token.expires_at, "Refreshed Strava token.");

				Ok(token)
			},
			Err(e) => {
				self.metrics.refresh.record_failure();

				Err(e)
			},
		}
	}

	fn install(&self, token: Token) {
		self.api.set_access_token(Some(token.access_token.clone()));

		*self.token.write() = Some(token);
	}
}
impl Debug for StravaSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StravaSession")
			.field("config", &self.config)
			.field("token", &*self.token.read())
			.field("pending", &self.pending.lock().is_some())
			.field("athletes", &self.athletes.lock().len())
			.field("gears", &self.gears.lock().len())
			.field("clubs", &self.clubs.lock().len())
			.finish()
	}
}
