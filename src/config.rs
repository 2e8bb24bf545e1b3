//! Integration configuration: Strava client credentials plus optional endpoint overrides.
//!
//! The hub hands the integration a JSON document; only `client_id` and `client_secret` are
//! required and unknown keys are ignored so the host may keep its own options alongside.

// self
use crate::{_prelude::*, error::ConfigError};

/// Section key the integration reads from a host configuration document.
pub const DOMAIN: &str = "strava";
/// Path the authorization callback is served on.
pub const CALLBACK_PATH: &str = "/api/strava";

const DEFAULT_EXTERNAL_URL: &str = "http://127.0.0.1:8123";
const DEFAULT_AUTHORIZE_URL: &str = "https://www.strava.com/oauth/authorize";
const DEFAULT_TOKEN_URL: &str = "https://www.strava.com/oauth/token";
const DEFAULT_API_BASE_URL: &str = "https://www.strava.com/api/v3";

/// Validated integration settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct IntegrationConfig {
	/// Strava application client identifier.
	pub client_id: String,
	/// Strava application client secret.
	pub client_secret: String,
	/// Externally reachable base URL of the hub; the callback path is appended to it.
	#[serde(default = "default_external_url")]
	pub external_url: Url,
	/// Scopes requested during authorization (joined with `,` as Strava expects).
	#[serde(default = "default_scopes")]
	pub scopes: Vec<String>,
	/// Strava endpoints, overridable for tests and proxies.
	#[serde(default)]
	pub endpoints: StravaEndpoints,
}
impl IntegrationConfig {
	/// Creates a configuration with default endpoints for the provided credentials.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			external_url: default_external_url(),
			scopes: default_scopes(),
			endpoints: StravaEndpoints::default(),
		}
	}

	/// Parses and validates the integration section itself.
	pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
		let config: Self = serde_path_to_error::deserialize(value)
			.map_err(|source| ConfigError::Parse { source })?;

		config.validate()?;

		Ok(config)
	}

	/// Parses and validates a JSON string holding the integration section.
	pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(raw);
		let config: Self = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::Parse { source })?;

		config.validate()?;

		Ok(config)
	}

	/// Extracts the `strava` section from a host document and validates it.
	pub fn from_host_config(mut document: serde_json::Value) -> Result<Self, ConfigError> {
		let section = document
			.get_mut(DOMAIN)
			.map(serde_json::Value::take)
			.ok_or(ConfigError::MissingSection { section: DOMAIN })?;

		Self::from_value(section)
	}

	/// Overrides the hub's external base URL.
	pub fn with_external_url(mut self, url: Url) -> Self {
		self.external_url = url;

		self
	}

	/// Overrides the Strava endpoints.
	pub fn with_endpoints(mut self, endpoints: StravaEndpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Rejects empty credentials and URLs that cannot carry paths.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::EmptyOption { option: "client_id" });
		}
		if self.client_secret.trim().is_empty() {
			return Err(ConfigError::EmptyOption { option: "client_secret" });
		}

		for url in [
			&self.external_url,
			&self.endpoints.authorize_url,
			&self.endpoints.token_url,
			&self.endpoints.api_base_url,
		] {
			if url.cannot_be_a_base() {
				return Err(ConfigError::CannotBeABase { value: url.to_string() });
			}
		}

		Ok(())
	}

	/// Callback URL Strava redirects the user to after authorization.
	pub fn callback_url(&self) -> Result<Url, ConfigError> {
		join_path(&self.external_url, CALLBACK_PATH)
	}

	/// Scopes joined with Strava's `,` delimiter.
	pub fn scope_param(&self) -> String {
		self.scopes.join(",")
	}
}
impl Debug for IntegrationConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IntegrationConfig")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &!self.client_secret.is_empty())
			.field("external_url", &self.external_url)
			.field("scopes", &self.scopes)
			.field("endpoints", &self.endpoints)
			.finish()
	}
}

/// Strava OAuth and REST endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StravaEndpoints {
	/// Authorization page users are sent to.
	pub authorize_url: Url,
	/// Token endpoint for code exchanges and refreshes.
	pub token_url: Url,
	/// REST API base (resource paths are appended to it).
	pub api_base_url: Url,
}
impl StravaEndpoints {
	/// Builds endpoints rooted at a single origin, as served by a mock or proxy.
	pub fn rooted_at(origin: &str) -> Result<Self, ConfigError> {
		let base = parse_url(origin)?;

		Ok(Self {
			authorize_url: join_path(&base, "/oauth/authorize")?,
			token_url: join_path(&base, "/oauth/token")?,
			api_base_url: join_path(&base, "/api/v3")?,
		})
	}

	/// Resolves a resource path (e.g., `/gear/b1`) against the API base.
	pub fn resource_url(&self, path: &str) -> Result<Url, ConfigError> {
		join_path(&self.api_base_url, path)
	}
}
impl Default for StravaEndpoints {
	fn default() -> Self {
		Self {
			authorize_url: builtin_url(DEFAULT_AUTHORIZE_URL),
			token_url: builtin_url(DEFAULT_TOKEN_URL),
			api_base_url: builtin_url(DEFAULT_API_BASE_URL),
		}
	}
}

fn default_external_url() -> Url {
	builtin_url(DEFAULT_EXTERNAL_URL)
}

fn default_scopes() -> Vec<String> {
	["read", "activity:read_all", "profile:read_all"].into_iter().map(Into::into).collect()
}

fn builtin_url(raw: &'static str) -> Url {
	match Url::parse(raw) {
		Ok(url) => url,
		Err(e) => unreachable!("built-in URL `{raw}` must parse: {e}"),
	}
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { value: raw.to_owned(), source })
}

fn join_path(base: &Url, path: &str) -> Result<Url, ConfigError> {
	let mut url = base.clone();

	{
		let mut segments = url
			.path_segments_mut()
			.map_err(|_| ConfigError::CannotBeABase { value: base.to_string() })?;

		segments.pop_if_empty();
		segments.extend(path.split('/').filter(|segment| !segment.is_empty()));
	}

	Ok(url)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn minimal_section_uses_defaults_and_tolerates_extra_keys() {
		let config = IntegrationConfig::from_json(
			r#"{"client_id":"abc","client_secret":"xyz","unused":{"nested":true}}"#,
		)
		.expect("Minimal configuration should parse.");

		assert_eq!(config.client_id, "abc");
		assert_eq!(config.client_secret, "xyz");
		assert_eq!(config.endpoints, StravaEndpoints::default());
		assert_eq!(config.scope_param(), "read,activity:read_all,profile:read_all");
		assert_eq!(
			config.callback_url().expect("Callback URL should build.").as_str(),
			"http://127.0.0.1:8123/api/strava"
		);
	}

	#[test]
	fn missing_secret_reports_the_path() {
		let err = IntegrationConfig::from_json(r#"{"client_id":"abc"}"#)
			.expect_err("Missing client_secret must fail.");

		assert!(matches!(err, ConfigError::Parse { .. }));
		assert!(format!("{:?}", err).contains("client_secret"));
	}

	#[test]
	fn empty_credentials_are_rejected() {
		let err = IntegrationConfig::from_value(serde_json::json!({
			"client_id": " ",
			"client_secret": "xyz",
		}))
		.expect_err("Blank client_id must fail validation.");

		assert!(matches!(err, ConfigError::EmptyOption { option: "client_id" }));
	}

	#[test]
	fn host_document_section_is_extracted() {
		let config = IntegrationConfig::from_host_config(serde_json::json!({
			"http": { "server_port": 8123 },
			"strava": {
				"client_id": "abc",
				"client_secret": "xyz",
				"external_url": "https://hub.example.com/base/",
			},
		}))
		.expect("Host document should yield the strava section.");

		assert_eq!(
			config.callback_url().expect("Callback URL should build.").as_str(),
			"https://hub.example.com/base/api/strava"
		);

		let err = IntegrationConfig::from_host_config(serde_json::json!({ "http": {} }))
			.expect_err("Documents without the section must fail.");

		assert!(matches!(err, ConfigError::MissingSection { section: "strava" }));
	}

	#[test]
	fn endpoints_can_be_rooted_at_a_mock_origin() {
		let endpoints =
			StravaEndpoints::rooted_at("http://127.0.0.1:5000").expect("Origin should parse.");

		assert_eq!(endpoints.token_url.as_str(), "http://127.0.0.1:5000/oauth/token");
		assert_eq!(
			endpoints.resource_url("/athletes/7/stats").expect("Path should join.").as_str(),
			"http://127.0.0.1:5000/api/v3/athletes/7/stats"
		);
	}

	#[test]
	fn debug_output_hides_the_secret() {
		let config = IntegrationConfig::new("abc", "very-secret");

		assert!(!format!("{config:?}").contains("very-secret"));
	}
}
