//! Gear holder: one piece of equipment fetched by id.

// self
use crate::{
	_prelude::*,
	auth::GearId,
	data::{self, Cached, UpdateOutcome},
	model::Gear,
	obs::OperationKind,
	session::StravaSession,
	throttle::Throttle,
};

/// Cached gear data.
#[derive(Debug)]
pub struct GearData {
	id: GearId,
	throttle: Throttle,
	cached: RwLock<Option<Cached<Gear>>>,
}
impl GearData {
	/// Creates an empty holder.
	pub fn new(id: GearId) -> Self {
		Self::with_throttle(id, Throttle::default())
	}

	/// Creates an empty holder with a custom throttle.
	pub fn with_throttle(id: GearId, throttle: Throttle) -> Self {
		Self { id, throttle, cached: RwLock::new(None) }
	}

	/// Gear id.
	pub fn id(&self) -> &GearId {
		&self.id
	}

	/// Cached payload, if an update has succeeded.
	pub fn data(&self) -> Option<Gear> {
		self.cached.read().as_ref().map(|cached| cached.value.clone())
	}

	/// When the cached payload was fetched.
	pub fn updated_at(&self) -> Option<OffsetDateTime> {
		self.cached.read().as_ref().map(|cached| cached.updated_at)
	}

	/// Refetches the gear, throttled.
	pub async fn update(&self, session: &StravaSession) -> Result<UpdateOutcome> {
		let fetch = async {
			let value = session.api().gear(&self.id).await?;

			*self.cached.write() = Some(Cached::now(value));

			Ok::<_, Error>(())
		};

		data::throttled_update(&self.throttle, session, OperationKind::Gear, self.id.as_ref(), fetch)
			.await
	}
}
