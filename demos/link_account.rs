//! Walks through linking a Strava account end to end against a local stand-in for Strava.
//!
//! 1. `setup()` finds no persisted token and raises the authorization prompt.
//! 2. The callback router is served with axum; the demo plays the browser and follows the
//!    redirect Strava would issue.
//! 3. The exchanged token is persisted to a `FileStore` and athlete data is fetched.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use tracing_subscriber::EnvFilter;
// self
use strava_hub::{
	auth::AthleteId,
	callback,
	config::{CALLBACK_PATH, IntegrationConfig, StravaEndpoints},
	http::ReqwestHttpClient,
	reqwest::Client,
	session::{LogPrompt, StravaSession},
	store::FileStore,
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| "strava_hub=info".into()),
		)
		.init();

	let strava = MockServer::start_async().await;
	let expires_at = time::OffsetDateTime::now_utc().unix_timestamp() + 21_600;

	strava
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200).header("content-type", "application/json").body(format!(
				"{{\"token_type\":\"Bearer\",\"access_token\":\"demo-access\",\
				\"refresh_token\":\"demo-refresh\",\"expires_in\":21600,\"expires_at\":{expires_at},\
				\"athlete\":{{\"id\":227615,\"firstname\":\"Demo\",\"lastname\":\"Rider\"}}}}"
			));
		})
		.await;
	strava
		.mock_async(|when, then| {
			when.method(GET).path("/api/v3/athletes/227615");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"id":227615,"firstname":"Demo","lastname":"Rider","city":"Oakland"}"#);
		})
		.await;
	strava
		.mock_async(|when, then| {
			when.method(GET).path("/api/v3/athletes/227615/stats");
			then.status(200).header("content-type", "application/json").body(
				r#"{"ytd_ride_totals":{"count":42,"distance":1234567.0,"moving_time":180000}}"#,
			);
		})
		.await;
	strava
		.mock_async(|when, then| {
			when.method(GET).path("/api/v3/athlete/activities");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"[{"id":987,"name":"Morning Ride","distance":24931.4}]"#);
		})
		.await;
	strava
		.mock_async(|when, then| {
			when.method(GET).path("/api/v3/activities/987");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"id":987,"name":"Morning Ride","distance":24931.4,"calories":870.2}"#);
		})
		.await;

	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
	let hub_url = Url::parse(&format!("http://{}", listener.local_addr()?))?;
	let config = IntegrationConfig::new("demo-client", "demo-secret")
		.with_external_url(hub_url.clone())
		.with_endpoints(StravaEndpoints::rooted_at(&strava.base_url())?);
	let store_dir = std::env::temp_dir().join(format!("strava-hub-demo-{}", std::process::id()));
	let store = Arc::new(FileStore::open(&store_dir)?);
	let session = Arc::new(StravaSession::with_reqwest(
		config,
		ReqwestHttpClient::with_client(Client::new()),
		store.clone(),
		Arc::new(LogPrompt::default()),
	)?);

	session.setup().await?;

	let pending = session.pending().ok_or_else(|| color_eyre::eyre::eyre!("no prompt raised"))?;

	println!("Authorize at: {}", pending.authorize_url);

	let router = callback::router(session.clone());

	tokio::spawn(async move { axum::serve(listener, router).await });

	let mut redirect = hub_url.join(CALLBACK_PATH)?;

	redirect
		.query_pairs_mut()
		.append_pair("state", &pending.state)
		.append_pair("code", "demo-code")
		.append_pair("scope", "read,activity:read_all,profile:read_all");

	let response = Client::new().get(redirect).send().await?;

	println!("Callback answered {} (authorized: {}).", response.status(), session.is_authorized());
	println!("Token persisted to {}.", store.path().display());

	let athlete = session.get_athlete(&AthleteId::from(227_615_u64));

	athlete.update(&session).await?;

	let snapshot = athlete.snapshot();

	if let Some(details) = &snapshot.details {
		println!("Athlete: {}", details.display_name());
	}
	if let Some(stats) = &snapshot.stats {
		println!("Year-to-date rides: {}", stats.ytd_ride_totals.count);
	}
	if let Some(activity) = &snapshot.last_activity {
		println!(
			"Latest activity: {} ({:.1} km)",
			activity.summary.name,
			activity.summary.distance / 1000.
		);
	}

	std::fs::remove_dir_all(store_dir)?;

	Ok(())
}
