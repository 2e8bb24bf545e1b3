//! Reqwest transport for Strava calls, with per-request response metadata.
//!
//! Token exchanges run through the `oauth2` crate, which accepts any [`AsyncHttpClient`]. The
//! [`InstrumentedHandle`] returned by [`ReqwestHttpClient::instrumented`] fulfils that contract
//! and records the HTTP status, `Retry-After`, and Strava's rate-limit headers in a
//! [`ResponseMetadataSlot`] so error mapping sees the same metadata for token and resource
//! calls alike.

// std
use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;

const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
const RATE_LIMIT_USAGE: &str = "x-ratelimit-usage";

/// Strava request budget as reported by `X-RateLimit-Limit` / `X-RateLimit-Usage`.
///
/// Both headers carry `short,daily` pairs (15-minute window, then day).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RateLimitUsage {
	/// Requests allowed per 15-minute window.
	pub short_limit: u32,
	/// Requests allowed per day.
	pub daily_limit: u32,
	/// Requests used in the current 15-minute window.
	pub short_usage: u32,
	/// Requests used today.
	pub daily_usage: u32,
}
impl RateLimitUsage {
	/// Parses both headers, returning `None` unless both are present and well-formed.
	pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
		let (short_limit, daily_limit) = parse_pair(headers, RATE_LIMIT_LIMIT)?;
		let (short_usage, daily_usage) = parse_pair(headers, RATE_LIMIT_USAGE)?;

		Some(Self { short_limit, daily_limit, short_usage, daily_usage })
	}

	/// Returns `true` once either window is used up.
	pub fn is_exhausted(&self) -> bool {
		self.short_usage >= self.short_limit || self.daily_usage >= self.daily_limit
	}
}

/// Metadata captured from the most recent HTTP response.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Strava rate-limit budget, if the response carried it.
	pub rate_limit: Option<RateLimitUsage>,
}
impl ResponseMetadata {
	/// Captures status and headers from a response.
	pub fn capture(status: u16, headers: &HeaderMap) -> Self {
		Self {
			status: Some(status),
			retry_after: parse_retry_after(headers),
			rate_limit: RateLimitUsage::from_headers(headers),
		}
	}

	/// Emits the rate-limit budget at debug level.
	pub fn log(&self, endpoint: &str) {
		if let Some(usage) = self.rate_limit {
			tracing::debug!(
				endpoint,
				short_usage = usage.short_usage,
				short_limit = usage.short_limit,
				daily_usage = usage.daily_usage,
				daily_limit = usage.daily_limit,
				"Strava rate limit usage."
			);

			if usage.is_exhausted() {
				tracing::warn!(endpoint, "Strava rate limit exhausted.");
			}
		}
	}
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
///
/// A fresh slot is created for each token request and read right after `oauth2` resolves.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token requests must not follow redirects; configure any custom client accordingly.
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds an `oauth2` transport handle that records response metadata in `slot`.
	pub fn instrumented(&self, slot: ResponseMetadataSlot) -> InstrumentedHandle {
		InstrumentedHandle::new(self.0.clone(), slot)
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl Debug for ReqwestHttpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ReqwestHttpClient(..)")
	}
}

struct InstrumentedHttpClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}

/// [`AsyncHttpClient`] handle returned by [`ReqwestHttpClient::instrumented`].
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
impl InstrumentedHandle {
	fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self(Arc::new(InstrumentedHttpClient { client, slot }))
	}
}
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			client.slot.take();

			let response = client
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();

			client.slot.store(ResponseMetadata::capture(status.as_u16(), &headers));

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

fn parse_pair(headers: &HeaderMap, name: &str) -> Option<(u32, u32)> {
	let raw = headers.get(name)?.to_str().ok()?;
	let (short, daily) = raw.split_once(',')?;

	Some((short.trim().parse().ok()?, daily.trim().parse().ok()?))
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
