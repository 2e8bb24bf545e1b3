//! Strava resource payloads.
//!
//! Only the fields the hub surfaces are modeled; everything except identifiers is optional or
//! defaulted so additions on Strava's side never break parsing.

// self
use crate::_prelude::*;

/// Athlete profile (summary or detailed representation).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Athlete {
	/// Strava athlete id.
	pub id: u64,
	/// Login name.
	pub username: Option<String>,
	/// First name.
	pub firstname: Option<String>,
	/// Last name.
	pub lastname: Option<String>,
	/// Home city.
	pub city: Option<String>,
	/// Home state or region.
	pub state: Option<String>,
	/// Home country.
	pub country: Option<String>,
	/// `M`, `F`, or unset.
	pub sex: Option<String>,
	/// Whether the athlete has a paid subscription.
	pub premium: bool,
	/// Large profile picture URL.
	pub profile: Option<String>,
	/// Medium profile picture URL.
	pub profile_medium: Option<String>,
	/// Follower count (detailed representation only).
	pub follower_count: Option<u32>,
	/// Friend count (detailed representation only).
	pub friend_count: Option<u32>,
	/// Functional threshold power in watts.
	pub ftp: Option<u32>,
	/// Weight in kilograms.
	pub weight: Option<f64>,
	/// Account creation time (RFC 3339).
	pub created_at: Option<String>,
	/// Bikes owned by the athlete.
	pub bikes: Vec<GearSummary>,
	/// Shoes owned by the athlete.
	pub shoes: Vec<GearSummary>,
	/// Clubs the athlete belongs to.
	pub clubs: Vec<ClubSummary>,
}
impl Athlete {
	/// `firstname lastname`, skipping missing parts.
	pub fn display_name(&self) -> String {
		[self.firstname.as_deref(), self.lastname.as_deref()]
			.into_iter()
			.flatten()
			.filter(|part| !part.is_empty())
			.collect::<Vec<_>>()
			.join(" ")
	}
}

/// Rolled-up totals for one sport over one period.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityTotals {
	/// Number of activities.
	pub count: u32,
	/// Total distance in meters.
	pub distance: f64,
	/// Total moving time in seconds.
	pub moving_time: u64,
	/// Total elapsed time in seconds.
	pub elapsed_time: u64,
	/// Total elevation gain in meters.
	pub elevation_gain: f64,
	/// Number of achievements.
	pub achievement_count: Option<u32>,
}

/// Athlete statistics as returned by `/athletes/{id}/stats`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AthleteStats {
	/// Longest ride distance in meters.
	pub biggest_ride_distance: Option<f64>,
	/// Highest climb in meters.
	pub biggest_climb_elevation_gain: Option<f64>,
	/// Last four weeks of rides.
	pub recent_ride_totals: ActivityTotals,
	/// Last four weeks of runs.
	pub recent_run_totals: ActivityTotals,
	/// Last four weeks of swims.
	pub recent_swim_totals: ActivityTotals,
	/// Year-to-date rides.
	pub ytd_ride_totals: ActivityTotals,
	/// Year-to-date runs.
	pub ytd_run_totals: ActivityTotals,
	/// Year-to-date swims.
	pub ytd_swim_totals: ActivityTotals,
	/// All-time rides.
	pub all_ride_totals: ActivityTotals,
	/// All-time runs.
	pub all_run_totals: ActivityTotals,
	/// All-time swims.
	pub all_swim_totals: ActivityTotals,
}

/// Latitude/longitude pair, serialized as a two-element array.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng(pub f64, pub f64);

/// Activity entry as returned by `/athlete/activities`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivitySummary {
	/// Strava activity id.
	pub id: u64,
	/// Activity title.
	pub name: String,
	/// Legacy activity type (e.g., `Ride`).
	#[serde(rename = "type")]
	pub kind: Option<String>,
	/// Sport type (e.g., `MountainBikeRide`).
	pub sport_type: Option<String>,
	/// Distance in meters.
	pub distance: f64,
	/// Moving time in seconds.
	pub moving_time: u64,
	/// Elapsed time in seconds.
	pub elapsed_time: u64,
	/// Elevation gain in meters.
	pub total_elevation_gain: f64,
	/// Start time, UTC (RFC 3339).
	pub start_date: Option<String>,
	/// Start time, local (RFC 3339 without offset semantics).
	pub start_date_local: Option<String>,
	/// Time zone label.
	pub timezone: Option<String>,
	/// Start position.
	pub start_latlng: Option<LatLng>,
	/// End position.
	pub end_latlng: Option<LatLng>,
	/// Average speed in meters per second.
	pub average_speed: Option<f64>,
	/// Maximum speed in meters per second.
	pub max_speed: Option<f64>,
	/// Average power in watts.
	pub average_watts: Option<f64>,
	/// Energy output in kilojoules.
	pub kilojoules: Option<f64>,
	/// Average heart rate in beats per minute.
	pub average_heartrate: Option<f64>,
	/// Maximum heart rate in beats per minute.
	pub max_heartrate: Option<f64>,
	/// Gear used, if any.
	pub gear_id: Option<String>,
	/// Kudos received.
	pub kudos_count: u32,
	/// Achievements earned.
	pub achievement_count: u32,
	/// Whether the activity was recorded on a trainer.
	pub trainer: bool,
	/// Whether the activity is a commute.
	pub commute: bool,
	/// Whether the activity was entered manually.
	pub manual: bool,
	/// Whether the activity is private.
	pub private: bool,
}

/// Detailed activity as returned by `/activities/{id}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Activity {
	/// Summary fields shared with the list representation.
	#[serde(flatten)]
	pub summary: ActivitySummary,
	/// Free-form description.
	pub description: Option<String>,
	/// Estimated calories burned.
	pub calories: Option<f64>,
	/// Device that recorded the activity.
	pub device_name: Option<String>,
	/// Gear used, in summary form.
	pub gear: Option<GearSummary>,
	/// Raw segment efforts, present when requested with `include_all_efforts`.
	#[serde(skip_serializing)]
	pub segment_efforts: Vec<serde_json::Value>,
}

/// Gear entry embedded in athlete and activity payloads.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GearSummary {
	/// Gear id (e.g., `b12345`).
	pub id: String,
	/// Display name.
	pub name: Option<String>,
	/// Whether this is the athlete's default gear.
	pub primary: bool,
	/// Distance in meters.
	pub distance: f64,
}

/// Gear as returned by `/gear/{id}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gear {
	/// Gear id (e.g., `b12345`).
	pub id: String,
	/// Display name.
	pub name: Option<String>,
	/// Whether this is the athlete's default gear.
	pub primary: bool,
	/// Distance in meters.
	pub distance: f64,
	/// Brand name.
	pub brand_name: Option<String>,
	/// Model name.
	pub model_name: Option<String>,
	/// Frame type code (bikes only).
	pub frame_type: Option<u32>,
	/// Free-form description.
	pub description: Option<String>,
	/// Whether the gear is retired.
	pub retired: bool,
}

/// Club entry embedded in athlete payloads.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClubSummary {
	/// Strava club id.
	pub id: u64,
	/// Club name.
	pub name: String,
	/// Member count.
	pub member_count: u32,
}

/// Club as returned by `/clubs/{id}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Club {
	/// Strava club id.
	pub id: u64,
	/// Club name.
	pub name: String,
	/// Main sport of the club.
	pub sport_type: Option<String>,
	/// City.
	pub city: Option<String>,
	/// State or region.
	pub state: Option<String>,
	/// Country.
	pub country: Option<String>,
	/// Whether the club is private.
	pub private: bool,
	/// Member count.
	pub member_count: u32,
	/// Whether the club is featured.
	pub featured: bool,
	/// Whether the club is verified.
	pub verified: bool,
	/// Vanity URL slug.
	pub url: Option<String>,
	/// Description.
	pub description: Option<String>,
	/// Large picture URL.
	pub profile: Option<String>,
}

/// Error body Strava returns for non-success responses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Fault {
	/// Top-level message (e.g., `Bad Request`).
	pub message: String,
	/// Field-level details.
	pub errors: Vec<FaultDetail>,
}
impl Fault {
	/// Parses a fault body, returning `None` when it is not Strava's error shape.
	pub fn parse(body: &[u8]) -> Option<Self> {
		serde_json::from_slice::<Self>(body).ok().filter(|fault| !fault.message.is_empty())
	}

	/// Returns `true` when any detail names `resource`.
	pub fn concerns(&self, resource: &str) -> bool {
		self.errors.iter().any(|detail| detail.resource == resource)
	}

	/// Human-readable summary (`message: resource.field code; ...`).
	pub fn summary(&self) -> String {
		if self.errors.is_empty() {
			return self.message.clone();
		}

		let details = self
			.errors
			.iter()
			.map(|detail| format!("{}.{} {}", detail.resource, detail.field, detail.code))
			.collect::<Vec<_>>()
			.join("; ");

		format!("{}: {details}", self.message)
	}
}

/// One field-level entry of a [`Fault`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FaultDetail {
	/// Resource the error concerns (e.g., `AuthorizationCode`).
	pub resource: String,
	/// Offending field.
	pub field: String,
	/// Error code (e.g., `invalid`).
	pub code: String,
}
