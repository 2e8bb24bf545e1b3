//! Authorization callback endpoint.
//!
//! Strava redirects the user's browser to [`CALLBACK_PATH`] with `code` (and the `state` we
//! sent) once access is granted, or with `error=access_denied` when it is refused. The handler
//! needs no authentication of its own; it is the handshake.

// crates.io
use axum::{
	Router,
	extract::{Query, State},
	http::StatusCode,
	response::{Html, IntoResponse, Response},
	routing::get,
};
// self
use crate::{_prelude::*, config::CALLBACK_PATH, session::StravaSession};

const SUCCESS_PAGE: &str = "<html><body><h1>Strava account linked</h1>\
	<p>You can close this window.</p></body></html>";

/// Query parameters Strava appends to the redirect.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CallbackQuery {
	/// Authorization code to exchange.
	pub code: Option<String>,
	/// State value echoed back from the authorization URL.
	pub state: Option<String>,
	/// Error reported by Strava (e.g., `access_denied`).
	pub error: Option<String>,
	/// Scopes the user actually granted.
	pub scope: Option<String>,
}

/// Failures surfaced to the browser.
#[derive(Debug, ThisError)]
pub enum CallbackError {
	/// The redirect carried no `code`.
	#[error("Missing authorization code.")]
	MissingCode,
	/// The redirect carried no `state` although a request is outstanding.
	#[error("Missing authorization state.")]
	MissingState,
	/// The echoed `state` does not match the outstanding request.
	#[error("Authorization state mismatch.")]
	StateMismatch,
	/// Strava reported an error instead of a code.
	#[error("Strava denied authorization: {reason}.")]
	Denied {
		/// Error string from the redirect.
		reason: String,
	},
	/// The code exchange failed.
	#[error("Authorization failed.")]
	Exchange(#[source] Error),
}
impl CallbackError {
	/// HTTP status returned for this failure.
	pub fn status(&self) -> StatusCode {
		match self {
			CallbackError::MissingCode
			| CallbackError::MissingState
			| CallbackError::StateMismatch => StatusCode::BAD_REQUEST,
			CallbackError::Denied { .. } => StatusCode::FORBIDDEN,
			CallbackError::Exchange(_) => StatusCode::BAD_GATEWAY,
		}
	}
}
impl IntoResponse for CallbackError {
	fn into_response(self) -> Response {
		tracing::warn!(error = %self, "Strava authorization callback failed.");

		(self.status(), self.to_string()).into_response()
	}
}

/// Router serving the callback on [`CALLBACK_PATH`].
pub fn router(session: Arc<StravaSession>) -> Router {
	Router::new().route(CALLBACK_PATH, get(handle_callback)).with_state(session)
}

async fn handle_callback(
	State(session): State<Arc<StravaSession>>,
	Query(query): Query<CallbackQuery>,
) -> Result<Html<&'static str>, CallbackError> {
	if let Some(reason) = query.error {
		return Err(CallbackError::Denied { reason });
	}

	let code = query.code.filter(|code| !code.is_empty()).ok_or(CallbackError::MissingCode)?;

	// Any state is accepted only when no request is outstanding (e.g., after a restart).
	match query.state.as_deref() {
		Some(state) => session.validate_state(state).map_err(|_| CallbackError::StateMismatch)?,
		None if session.pending().is_some() => return Err(CallbackError::MissingState),
		None => (),
	}
	if let Some(scope) = query.scope.as_deref() {
		tracing::debug!(scope, "Strava granted scopes.");
	}

	session.authorize(&code).await.map_err(CallbackError::Exchange)?;

	Ok(Html(SUCCESS_PAGE))
}
