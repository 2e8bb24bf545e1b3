//! Crate-level error types shared by the session, the API adapter, and the token store.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// No token is held; the account still has to be linked.
	#[error("Strava account is not authorized.")]
	NotAuthorized,
	/// Strava rejected the grant (e.g., bad code or refresh token).
	#[error("Strava rejected the grant: {reason}.")]
	InvalidGrant {
		/// Strava- or crate-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Strava- or crate-supplied reason string.
		reason: String,
	},
	/// A resource endpoint answered with a non-success status.
	#[error("Strava API returned {status} for {endpoint}: {message}.")]
	Api {
		/// Endpoint path that failed.
		endpoint: String,
		/// HTTP status code.
		status: u16,
		/// Message extracted from the response body, if any.
		message: String,
	},
	/// A resource payload could not be parsed.
	#[error("Failed to decode the {endpoint} payload.")]
	Decode {
		/// Endpoint path whose payload was malformed.
		endpoint: String,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// One fetch of a fan-out group failed, so the whole group failed.
	#[error("Fetching {resource} failed.")]
	PartialFetch {
		/// Label of the sub-fetch that failed.
		resource: &'static str,
		/// Underlying failure.
		#[source]
		source: Box<Error>,
	},
}
impl Error {
	/// Wraps `self` as the failing member of a fan-out group.
	pub fn partial(resource: &'static str, source: Error) -> Self {
		Self::PartialFetch { resource, source: Box::new(source) }
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Configuration document could not be parsed.
	#[error("Configuration is invalid.")]
	Parse {
		/// Path-qualified parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Host configuration lacks the integration section.
	#[error("Configuration has no `{section}` section.")]
	MissingSection {
		/// Expected section key.
		section: &'static str,
	},
	/// A required string option is empty.
	#[error("Configuration option `{option}` must not be empty.")]
	EmptyOption {
		/// Offending option name.
		option: &'static str,
	},
	/// An endpoint or redirect URL is invalid.
	#[error("Configured URL `{value}` is invalid.")]
	InvalidUrl {
		/// Raw value that failed to parse.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A URL cannot carry path segments (e.g., `mailto:`).
	#[error("Configured URL `{value}` cannot be used as a base.")]
	CannotBeABase {
		/// Offending URL.
		value: String,
	},
	/// Token builder validation failed.
	#[error("Unable to build token.")]
	TokenBuild(#[from] crate::auth::TokenBuilderError),
	/// Token endpoint returned an expiry outside the supported range.
	#[error("The token expiry exceeds the supported range.")]
	ExpiryOutOfRange,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants.
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Strava returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Strava- or crate-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling Strava.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling Strava.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
