//! Resource data holders: per-id caches of athlete, gear, and club data.
//!
//! Every holder is throttled independently (see [`crate::throttle`]) and asks the session for a
//! usable token before fetching. A failed update leaves the previously cached values in place.

pub mod athlete;
pub mod club;
pub mod gear;

pub use athlete::*;
pub use club::*;
pub use gear::*;

// self
use crate::{
	_prelude::*,
	obs::{self, OperationKind},
	session::StravaSession,
	throttle::Throttle,
};

/// Result of a holder update call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
	/// The fetch ran and the cache was replaced.
	Updated,
	/// The call fell inside the throttle window (or overlapped a running update) and did nothing.
	Throttled,
}

/// Cached payload plus the moment it was fetched.
#[derive(Clone, Debug, PartialEq)]
pub struct Cached<T> {
	/// Fetched payload.
	pub value: T,
	/// When the fetch completed.
	pub updated_at: OffsetDateTime,
}
impl<T> Cached<T> {
	/// Stamps `value` with the current time.
	pub fn now(value: T) -> Self {
		Self { value, updated_at: OffsetDateTime::now_utc() }
	}
}

// Runs `fetch` under the holder's throttle once the session has a usable token.
async fn throttled_update<Fut>(
	throttle: &Throttle,
	session: &StravaSession,
	kind: OperationKind,
	id: &str,
	fetch: Fut,
) -> Result<UpdateOutcome>
where
	Fut: Future<Output = Result<()>>,
{
	let Some(permit) = throttle.try_acquire() else {
		tracing::debug!(operation = %kind, id, "Update throttled.");

		return Ok(UpdateOutcome::Throttled);
	};
	let result = match session.require_token().await {
		Ok(()) => obs::observe(kind, "update", fetch).await,
		// Nothing was fetched, so the first update after linking is not throttled.
		Err(Error::NotAuthorized) => {
			permit.forfeit();

			Err(Error::NotAuthorized)
		},
		Err(e) => Err(e),
	};

	match result {
		Ok(()) => Ok(UpdateOutcome::Updated),
		Err(e) => {
			tracing::warn!(operation = %kind, id, error = %e, "Update failed.");

			Err(e)
		},
	}
}
