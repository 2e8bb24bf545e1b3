//! Pending authorization and the host prompt facility it is surfaced through.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::_prelude::*;

/// Title shown on the authorization prompt.
pub const PROMPT_NAME: &str = "Strava";
/// Caption of the authorization link.
pub const PROMPT_LINK_NAME: &str = "Link Strava account";
/// Body text of the authorization prompt.
pub const PROMPT_DESCRIPTION: &str =
	"To link your Strava account, click the link, login, and authorize:";
/// Caption of the prompt's confirmation button.
pub const PROMPT_SUBMIT_CAPTION: &str = "I authorized successfully";

/// Opaque handle the host assigns to a raised prompt.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PromptHandle(String);
impl PromptHandle {
	/// Wraps a host-assigned identifier.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the identifier.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for PromptHandle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// User action the host is asked to surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptRequest {
	/// Prompt title.
	pub name: &'static str,
	/// Body text.
	pub description: &'static str,
	/// Caption of the link.
	pub link_name: &'static str,
	/// Authorization URL the link points to.
	pub link_url: Url,
	/// Caption of the confirmation button.
	pub submit_caption: &'static str,
}
impl PromptRequest {
	/// Builds the standard authorization prompt for `link_url`.
	pub fn authorization(link_url: Url) -> Self {
		Self {
			name: PROMPT_NAME,
			description: PROMPT_DESCRIPTION,
			link_name: PROMPT_LINK_NAME,
			link_url,
			submit_caption: PROMPT_SUBMIT_CAPTION,
		}
	}
}

/// Host facility for "user action required" prompts.
///
/// Calls are made while the session holds its pending-authorization lock; implementations must
/// not call back into the session.
pub trait AuthorizationPrompt
where
	Self: Send + Sync,
{
	/// Raises a prompt and returns its handle.
	fn request(&self, request: &PromptRequest) -> PromptHandle;

	/// Marks a prompt as resolved.
	fn done(&self, handle: &PromptHandle);
}

/// Prompt facility that only logs, for hosts without a user-facing surface.
#[derive(Debug, Default)]
pub struct LogPrompt {
	next: AtomicU64,
}
impl AuthorizationPrompt for LogPrompt {
	fn request(&self, request: &PromptRequest) -> PromptHandle {
		let handle = PromptHandle::new(format!(
			"{}-{}",
			request.name.to_lowercase(),
			self.next.fetch_add(1, Ordering::Relaxed)
		));

		tracing::info!(
			prompt = %handle,
			link = %request.link_url,
			"{} {}",
			request.description,
			request.link_name
		);

		handle
	}

	fn done(&self, handle: &PromptHandle) {
		tracing::info!(prompt = %handle, "Authorization prompt resolved.");
	}
}

/// Outstanding authorization request.
#[derive(Clone, Debug)]
pub struct PendingAuthorization {
	/// URL the user must visit.
	pub authorize_url: Url,
	/// Opaque state value that must round-trip via the callback.
	pub state: String,
	/// Handle of the raised prompt.
	pub handle: PromptHandle,
	/// When the request was raised.
	pub created_at: OffsetDateTime,
}
impl PendingAuthorization {
	pub(crate) fn new(authorize_url: Url, state: String, handle: PromptHandle) -> Self {
		Self { authorize_url, state, handle, created_at: OffsetDateTime::now_utc() }
	}

	/// Validates the returned `state` parameter after the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state {
			Ok(())
		} else {
			Err(Error::InvalidGrant { reason: "Authorization state mismatch".into() })
		}
	}
}
