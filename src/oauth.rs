//! OAuth 2.0 facade over Strava's authorization page and token endpoint.
//!
//! Strava deviates from RFC 6749 in two ways that matter here: token responses carry an
//! absolute `expires_at` (plus an `athlete` summary on code exchanges), and rejections use
//! Strava's own fault body instead of `{"error": ...}`. Both are handled below so the rest of
//! the crate only sees [`Token`] values and classified [`Error`]s.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, EndpointNotSet,
	EndpointSet, ExtraTokenFields, HttpClientError, RedirectUrl, RefreshToken, RequestTokenError,
	StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicErrorResponseType, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse, BasicTokenType,
	},
};
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::{Token, TokenSecret},
	config::IntegrationConfig,
	error::{ConfigError, TransientError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
	model::{Athlete, Fault},
};

/// Length of the random `state` value attached to authorization URLs.
pub const STATE_LEN: usize = 32;

type StravaTokenResponse = StandardTokenResponse<StravaTokenFields, BasicTokenType>;
type StravaOAuthClient = Client<
	BasicErrorResponse,
	StravaTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;
type StravaRequestTokenError =
	RequestTokenError<HttpClientError<ReqwestError>, BasicErrorResponse>;

/// Non-standard fields Strava adds to token responses.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StravaTokenFields {
	/// Absolute expiry as a unix timestamp in seconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<i64>,
	/// Summary of the athlete who granted access (code exchanges only).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub athlete: Option<Athlete>,
}
impl ExtraTokenFields for StravaTokenFields {}

/// Builds the URL users visit to grant the configured scopes.
pub fn authorize_url(config: &IntegrationConfig, redirect_uri: &Url, state: &str) -> Url {
	let mut url = config.endpoints.authorize_url.clone();

	url.query_pairs_mut()
		.append_pair("client_id", &config.client_id)
		.append_pair("redirect_uri", redirect_uri.as_str())
		.append_pair("response_type", "code")
		.append_pair("approval_prompt", "auto")
		.append_pair("scope", &config.scope_param())
		.append_pair("state", state);

	url
}

/// Generates a random alphanumeric `state` value.
pub fn generate_state() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}

/// Token-endpoint client for the configured Strava application.
pub struct StravaOAuth {
	client: StravaOAuthClient,
	http: ReqwestHttpClient,
}
impl StravaOAuth {
	/// Creates a facade posting client credentials in the request body, as Strava requires.
	pub fn new(config: &IntegrationConfig, http: ReqwestHttpClient) -> Result<Self> {
		let auth_url = AuthUrl::new(config.endpoints.authorize_url.to_string()).map_err(
			|source| ConfigError::InvalidUrl {
				value: config.endpoints.authorize_url.to_string(),
				source,
			},
		)?;
		let token_url = TokenUrl::new(config.endpoints.token_url.to_string()).map_err(
			|source| ConfigError::InvalidUrl {
				value: config.endpoints.token_url.to_string(),
				source,
			},
		)?;
		let callback = config.callback_url()?;
		let redirect_url = RedirectUrl::new(callback.to_string())
			.map_err(|source| ConfigError::InvalidUrl { value: callback.to_string(), source })?;
		let client: StravaOAuthClient = Client::new(ClientId::new(config.client_id.clone()))
			.set_client_secret(ClientSecret::new(config.client_secret.clone()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url)
			.set_auth_type(AuthType::RequestBody);

		Ok(Self { client, http })
	}

	/// Exchanges an authorization code for a token pair.
	pub async fn exchange_code(&self, code: &str) -> Result<Token> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http.instrumented(meta.clone());
		let response = self
			.client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error("authorization_code", meta.take(), err))?;

		if let Some(athlete) = &response.extra_fields().athlete {
			tracing::info!(athlete_id = athlete.id, "Strava account linked.");
		}

		token_from_response(&response, None)
	}

	/// Exchanges a refresh token for a new token pair.
	///
	/// Strava normally rotates the refresh token; when a response omits it, the presented one
	/// is kept.
	pub async fn refresh(&self, refresh_token: &TokenSecret) -> Result<Token> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http.instrumented(meta.clone());
		let secret = RefreshToken::new(refresh_token.expose().to_owned());
		let response = self
			.client
			.exchange_refresh_token(&secret)
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error("refresh_token", meta.take(), err))?;

		token_from_response(&response, Some(refresh_token))
	}
}
impl Debug for StravaOAuth {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StravaOAuth").field("client_id", self.client.client_id()).finish()
	}
}

fn token_from_response(
	response: &StravaTokenResponse,
	presented_refresh: Option<&TokenSecret>,
) -> Result<Token> {
	let mut builder = Token::builder().access_token(response.access_token().secret().to_owned());

	match (response.extra_fields().expires_at, response.expires_in()) {
		(Some(timestamp), _) => {
			let instant = OffsetDateTime::from_unix_timestamp(timestamp)
				.map_err(|_| ConfigError::ExpiryOutOfRange)?;

			builder = builder.expires_at(instant);
		},
		(None, Some(expires_in)) => {
			let secs = i64::try_from(expires_in.as_secs())
				.map_err(|_| ConfigError::ExpiryOutOfRange)?;

			builder = builder.expires_in(Duration::seconds(secs));
		},
		(None, None) => (),
	}

	match (response.refresh_token(), presented_refresh) {
		(Some(refresh), _) => builder = builder.refresh_token(refresh.secret().to_owned()),
		(None, Some(presented)) => builder = builder.refresh_token(presented.expose()),
		(None, None) => (),
	}

	builder.build().map_err(|e| ConfigError::from(e).into())
}

fn map_request_error(
	grant: &'static str,
	meta: Option<ResponseMetadata>,
	err: StravaRequestTokenError,
) -> Error {
	let meta_ref = meta.as_ref();

	if let Some(meta) = meta_ref {
		meta.log("/oauth/token");
	}

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(grant, response, meta_ref),
		RequestTokenError::Request(error) => map_transport_error(meta_ref, error),
		RequestTokenError::Parse(error, body) => match meta_status(meta_ref) {
			Some(status) if (400..500).contains(&status) =>
				map_fault(grant, status, &body, meta_ref),
			status => TransientError::TokenResponseParse { source: error, status }.into(),
		},
		RequestTokenError::Other(message) => TransientError::TokenEndpoint {
			message: format!("Token endpoint returned an unexpected response: {message}."),
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn map_server_response_error(
	grant: &'static str,
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let message = if let Some(description) = response.error_description() {
		format!("{grant} rejected: {description}")
	} else {
		format!("{grant} rejected: {}", response.error().as_ref())
	};

	match response.error() {
		BasicErrorResponseType::InvalidGrant => Error::InvalidGrant { reason: message },
		BasicErrorResponseType::InvalidClient | BasicErrorResponseType::UnauthorizedClient =>
			Error::InvalidClient { reason: message },
		_ => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

// Strava reports rejected codes and refresh tokens as `{"message", "errors": [...]}`.
fn map_fault(
	grant: &'static str,
	status: u16,
	body: &[u8],
	meta: Option<&ResponseMetadata>,
) -> Error {
	let Some(fault) = Fault::parse(body) else {
		return TransientError::TokenEndpoint {
			message: format!("{grant} failed with HTTP {status}"),
			status: Some(status),
			retry_after: meta_retry_after(meta),
		}
		.into();
	};
	let reason = format!("{grant} rejected: {}", fault.summary());

	if status == 401 || fault.concerns("Application") {
		return Error::InvalidClient { reason };
	}
	if status == 429 {
		return TransientError::TokenEndpoint {
			message: reason,
			status: Some(status),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}

	Error::InvalidGrant { reason }
}

fn map_transport_error(
	meta: Option<&ResponseMetadata>,
	err: HttpClientError<ReqwestError>,
) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransientError::TokenEndpoint {
			message: format!(
				"HTTP client error occurred while calling the token endpoint: {message}."
			),
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
		_ => TransientError::TokenEndpoint {
			message: "HTTP client error occurred while calling the token endpoint.".into(),
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

/// Classifies a reqwest failure shared by token and resource calls.
pub(crate) fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::TokenEndpoint {
			message: "Request timed out while calling Strava.".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}

	TransportError::from(err).into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}
