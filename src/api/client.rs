//! Reqwest-backed [`StravaApi`] implementation.

// crates.io
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	api::{ApiFuture, StravaApi},
	auth::{AthleteId, ClubId, GearId, Token, TokenSecret},
	config::IntegrationConfig,
	http::{ReqwestHttpClient, ResponseMetadata},
	model::{Activity, ActivitySummary, Athlete, AthleteStats, Club, Fault, Gear},
	oauth::{self, StravaOAuth},
};

/// Strava client holding the application credentials and the current bearer token.
pub struct StravaClient {
	config: IntegrationConfig,
	http: ReqwestHttpClient,
	oauth: StravaOAuth,
	access_token: RwLock<Option<TokenSecret>>,
}
impl StravaClient {
	/// Creates a client using a default reqwest client.
	pub fn new(config: IntegrationConfig) -> Result<Self> {
		Self::with_http_client(config, ReqwestHttpClient::default())
	}

	/// Creates a client reusing the caller's HTTP client.
	pub fn with_http_client(config: IntegrationConfig, http: ReqwestHttpClient) -> Result<Self> {
		config.validate()?;

		let oauth = StravaOAuth::new(&config, http.clone())?;

		Ok(Self { config, http, oauth, access_token: RwLock::new(None) })
	}

	/// Returns the configuration the client was built from.
	pub fn config(&self) -> &IntegrationConfig {
		&self.config
	}

	async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut url = self.config.endpoints.resource_url(path)?;

		if !query.is_empty() {
			let mut pairs = url.query_pairs_mut();

			for (key, value) in query {
				pairs.append_pair(key, value);
			}
		}

		let bearer = self.access_token.read().as_ref().map(TokenSecret::bearer);
		let mut request = self.http.get(url).header(ACCEPT, "application/json");

		if let Some(bearer) = bearer {
			request = request.header(AUTHORIZATION, bearer);
		}

		let response =
			request.send().await.map_err(|err| oauth::map_reqwest_error(None, err))?;
		let status = response.status();
		let meta = ResponseMetadata::capture(status.as_u16(), response.headers());

		meta.log(path);

		let body = response.bytes().await.map_err(|err| oauth::map_reqwest_error(Some(&meta), err))?;

		if !status.is_success() {
			let message = Fault::parse(&body)
				.map(|fault| fault.summary())
				.or_else(|| status.canonical_reason().map(str::to_owned))
				.unwrap_or_default();

			return Err(Error::Api { endpoint: path.to_owned(), status: status.as_u16(), message });
		}

		let mut de = serde_json::Deserializer::from_slice(&body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::Decode { endpoint: path.to_owned(), source })
	}
}
impl StravaApi for StravaClient {
	fn exchange_code<'a>(&'a self, code: &'a str) -> ApiFuture<'a, Token> {
		Box::pin(self.oauth.exchange_code(code))
	}

	fn refresh_access_token<'a>(&'a self, refresh_token: &'a TokenSecret) -> ApiFuture<'a, Token> {
		Box::pin(self.oauth.refresh(refresh_token))
	}

	fn set_access_token(&self, token: Option<TokenSecret>) {
		*self.access_token.write() = token;
	}

	fn athlete<'a>(&'a self, id: &'a AthleteId) -> ApiFuture<'a, Athlete> {
		Box::pin(async move { self.get_json(&format!("/athletes/{id}"), &[]).await })
	}

	fn athlete_stats<'a>(&'a self, id: &'a AthleteId) -> ApiFuture<'a, AthleteStats> {
		Box::pin(async move { self.get_json(&format!("/athletes/{id}/stats"), &[]).await })
	}

	fn activities(&self, page: u32, per_page: u32) -> ApiFuture<'_, Vec<ActivitySummary>> {
		Box::pin(async move {
			self.get_json(
				"/athlete/activities",
				&[("page", page.to_string()), ("per_page", per_page.to_string())],
			)
			.await
		})
	}

	fn activity(&self, id: u64, include_all_efforts: bool) -> ApiFuture<'_, Activity> {
		Box::pin(async move {
			self.get_json(
				&format!("/activities/{id}"),
				&[("include_all_efforts", include_all_efforts.to_string())],
			)
			.await
		})
	}

	fn gear<'a>(&'a self, id: &'a GearId) -> ApiFuture<'a, Gear> {
		Box::pin(async move { self.get_json(&format!("/gear/{id}"), &[]).await })
	}

	fn club<'a>(&'a self, id: &'a ClubId) -> ApiFuture<'a, Club> {
		Box::pin(async move { self.get_json(&format!("/clubs/{id}"), &[]).await })
	}
}
impl Debug for StravaClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StravaClient")
			.field("config", &self.config)
			.field("authorized", &self.access_token.read().is_some())
			.finish()
	}
}
impl TryFrom<IntegrationConfig> for StravaClient {
	type Error = Error;

	fn try_from(config: IntegrationConfig) -> Result<Self> {
		Self::new(config)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::ConfigError;

	#[test]
	fn invalid_configuration_is_rejected() {
		let err = StravaClient::new(IntegrationConfig::new("", "xyz"))
			.expect_err("Empty client ids must be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::EmptyOption { option: "client_id" })));
	}

	#[test]
	fn debug_output_hides_the_bearer_token() {
		let client = StravaClient::new(IntegrationConfig::new("abc", "xyz"))
			.expect("Client should build from a valid configuration.");

		client.set_access_token(Some(TokenSecret::new("bearer-secret")));

		let rendered = format!("{client:?}");

		assert!(rendered.contains("authorized: true"));
		assert!(!rendered.contains("bearer-secret"));
	}
}
