//! Storage contracts and built-in stores for the account's token record.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::Token};

/// Storage key the token record is persisted under.
pub const STORAGE_KEY: &str = "strava";
/// Schema version of the persisted record.
pub const STORAGE_VERSION: u32 = 1;

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for the single persisted [`Token`].
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the token record.
	fn save(&self, token: Token) -> StoreFuture<'_, ()>;

	/// Loads the persisted token record, if present.
	fn load(&self) -> StoreFuture<'_, Option<Token>>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// Persisted record carries a schema version this crate cannot read.
	#[error("Stored record `{key}` has unsupported version {found}.")]
	UnsupportedVersion {
		/// Storage key of the record.
		key: String,
		/// Version found on disk.
		found: u32,
	},
}

/// Versioned envelope written by persistent stores.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
	/// Schema version of `data`.
	pub version: u32,
	/// Storage key the record belongs to.
	pub key: String,
	/// Persisted token.
	pub data: Token,
}
impl StoredRecord {
	/// Wraps a token in the current schema version.
	pub fn new(data: Token) -> Self {
		Self { version: STORAGE_VERSION, key: STORAGE_KEY.into(), data }
	}

	/// Unwraps the token after checking the schema version.
	pub fn into_token(self) -> Result<Token, StoreError> {
		if self.version != STORAGE_VERSION {
			return Err(StoreError::UnsupportedVersion { key: self.key, found: self.version });
		}

		Ok(self.data)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn token() -> Token {
		Token::builder()
			.access_token("access")
			.refresh_token("refresh")
			.expires_at(macros::datetime!(2025-06-01 12:00 UTC))
			.build()
			.expect("Token fixture should build.")
	}

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unreachable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("disk unreachable"));

		let source = StdError::source(&error)
			.expect("Crate error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn stored_record_uses_versioned_envelope() {
		let value = serde_json::to_value(StoredRecord::new(token()))
			.expect("Stored record should serialize.");

		assert_eq!(value["version"], 1);
		assert_eq!(value["key"], "strava");
		assert_eq!(value["data"]["refresh_token"], "refresh");
	}

	#[test]
	fn unknown_versions_are_rejected() {
		let mut record = StoredRecord::new(token());

		record.version = 7;

		assert_eq!(
			record.into_token(),
			Err(StoreError::UnsupportedVersion { key: "strava".into(), found: 7 })
		);
	}
}
