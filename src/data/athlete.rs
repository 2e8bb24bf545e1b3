//! Athlete holder: profile, statistics, and latest activity fetched as one unit.

// self
use crate::{
	_prelude::*,
	api::StravaApi,
	auth::AthleteId,
	data::{self, UpdateOutcome},
	model::{Activity, Athlete, AthleteStats},
	obs::OperationKind,
	session::StravaSession,
	throttle::Throttle,
};

/// Everything cached for one athlete.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AthleteSnapshot {
	/// Detailed profile.
	pub details: Option<Athlete>,
	/// Statistics.
	pub stats: Option<AthleteStats>,
	/// Most recent activity in detail; `None` if the athlete has none.
	pub last_activity: Option<Activity>,
	/// When the three fields were last replaced.
	pub updated_at: Option<OffsetDateTime>,
}

/// Cached athlete data.
#[derive(Debug)]
pub struct AthleteData {
	id: AthleteId,
	throttle: Throttle,
	snapshot: RwLock<AthleteSnapshot>,
}
impl AthleteData {
	/// Creates an empty holder.
	pub fn new(id: AthleteId) -> Self {
		Self::with_throttle(id, Throttle::default())
	}

	/// Creates an empty holder with a custom throttle.
	pub fn with_throttle(id: AthleteId, throttle: Throttle) -> Self {
		Self { id, throttle, snapshot: RwLock::new(AthleteSnapshot::default()) }
	}

	/// Athlete id.
	pub fn id(&self) -> &AthleteId {
		&self.id
	}

	/// Clone of the cached data.
	pub fn snapshot(&self) -> AthleteSnapshot {
		self.snapshot.read().clone()
	}

	/// Cached profile.
	pub fn details(&self) -> Option<Athlete> {
		self.snapshot.read().details.clone()
	}

	/// Cached statistics.
	pub fn stats(&self) -> Option<AthleteStats> {
		self.snapshot.read().stats.clone()
	}

	/// Cached latest activity.
	pub fn last_activity(&self) -> Option<Activity> {
		self.snapshot.read().last_activity.clone()
	}

	/// Refreshes all three fields, throttled.
	///
	/// The latest activity, the profile, and the statistics are fetched concurrently; if any of
	/// them fails, none of the cached fields change and the failure is reported as
	/// [`Error::PartialFetch`].
	pub async fn update(&self, session: &StravaSession) -> Result<UpdateOutcome> {
		data::throttled_update(
			&self.throttle,
			session,
			OperationKind::Athlete,
			self.id.as_ref(),
			self.fetch(session.api()),
		)
		.await
	}

	async fn fetch(&self, api: &dyn StravaApi) -> Result<()> {
		let (last_activity, details, stats) = tokio::try_join!(
			async { latest_activity(api).await.map_err(|e| Error::partial("last_activity", e)) },
			async { api.athlete(&self.id).await.map_err(|e| Error::partial("details", e)) },
			async { api.athlete_stats(&self.id).await.map_err(|e| Error::partial("stats", e)) },
		)?;

		*self.snapshot.write() = AthleteSnapshot {
			details: Some(details),
			stats: Some(stats),
			last_activity,
			updated_at: Some(OffsetDateTime::now_utc()),
		};

		Ok(())
	}
}

async fn latest_activity(api: &dyn StravaApi) -> Result<Option<Activity>> {
	let Some(summary) = api.activities(1, 1).await?.into_iter().next() else {
		return Ok(None);
	};

	api.activity(summary.id, true).await.map(Some)
}
