//! Club holder: one club fetched by id.

// self
use crate::{
	_prelude::*,
	auth::ClubId,
	data::{self, Cached, UpdateOutcome},
	model::Club,
	obs::OperationKind,
	session::StravaSession,
	throttle::Throttle,
};

/// Cached club data.
#[derive(Debug)]
pub struct ClubData {
	id: ClubId,
	throttle: Throttle,
	cached: RwLock<Option<Cached<Club>>>,
}
impl ClubData {
	/// Creates an empty holder.
	pub fn new(id: ClubId) -> Self {
		Self::with_throttle(id, Throttle::default())
	}

	/// Creates an empty holder with a custom throttle.
	pub fn with_throttle(id: ClubId, throttle: Throttle) -> Self {
		Self { id, throttle, cached: RwLock::new(None) }
	}

	/// Club id.
	pub fn id(&self) -> &ClubId {
		&self.id
	}

	/// Cached payload, if an update has succeeded.
	pub fn data(&self) -> Option<Club> {
		self.cached.read().as_ref().map(|cached| cached.value.clone())
	}

	/// When the cached payload was fetched.
	pub fn updated_at(&self) -> Option<OffsetDateTime> {
		self.cached.read().as_ref().map(|cached| cached.updated_at)
	}

	/// Refetches the club, throttled.
	pub async fn update(&self, session: &StravaSession) -> Result<UpdateOutcome> {
		let fetch = async {
			let value = session.api().club(&self.id).await?;

			*self.cached.write() = Some(Cached::now(value));

			Ok::<_, Error>(())
		};

		data::throttled_update(&self.throttle, session, OperationKind::Club, self.id.as_ref(), fetch)
			.await
	}
}
