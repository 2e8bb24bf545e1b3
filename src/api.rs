//! Capability contract for everything the session asks of Strava.
//!
//! [`StravaClient`] talks to the real service; tests substitute their own implementation.

pub mod client;

pub use client::StravaClient;

// self
use crate::{
	_prelude::*,
	auth::{AthleteId, ClubId, GearId, Token, TokenSecret},
	model::{Activity, ActivitySummary, Athlete, AthleteStats, Club, Gear},
};

/// Boxed future returned by [`StravaApi`] methods.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Strava operations consumed by the session and the resource holders.
pub trait StravaApi
where
	Self: Send + Sync,
{
	/// Exchanges an authorization code for a token pair.
	fn exchange_code<'a>(&'a self, code: &'a str) -> ApiFuture<'a, Token>;

	/// Exchanges a refresh token for a new token pair.
	fn refresh_access_token<'a>(&'a self, refresh_token: &'a TokenSecret) -> ApiFuture<'a, Token>;

	/// Installs (or clears) the bearer token used by resource fetches.
	fn set_access_token(&self, token: Option<TokenSecret>);

	/// Fetches an athlete profile.
	fn athlete<'a>(&'a self, id: &'a AthleteId) -> ApiFuture<'a, Athlete>;

	/// Fetches an athlete's statistics.
	fn athlete_stats<'a>(&'a self, id: &'a AthleteId) -> ApiFuture<'a, AthleteStats>;

	/// Lists the authenticated athlete's activities, newest first.
	fn activities(&self, page: u32, per_page: u32) -> ApiFuture<'_, Vec<ActivitySummary>>;

	/// Fetches one activity in detail.
	fn activity(&self, id: u64, include_all_efforts: bool) -> ApiFuture<'_, Activity>;

	/// Fetches a piece of gear.
	fn gear<'a>(&'a self, id: &'a GearId) -> ApiFuture<'a, Gear>;

	/// Fetches a club.
	fn club<'a>(&'a self, id: &'a ClubId) -> ApiFuture<'a, Club>;
}
