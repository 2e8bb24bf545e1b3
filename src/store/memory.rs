//! Thread-safe in-memory [`TokenStore`] for local development and tests.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::Token,
	store::{StoreError, StoreFuture, TokenStore},
};

/// Storage backend that keeps the token in-process and counts writes.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	slot: Arc<RwLock<Option<Token>>>,
	saves: Arc<AtomicU64>,
}
impl MemoryStore {
	/// Creates a store pre-seeded with `token`.
	pub fn with_token(token: Token) -> Self {
		let store = Self::default();

		*store.slot.write() = Some(token);

		store
	}

	/// Returns the currently stored token without going through the async contract.
	pub fn snapshot(&self) -> Option<Token> {
		self.slot.read().clone()
	}

	/// Returns how many times [`TokenStore::save`] ran.
	pub fn saves(&self) -> u64 {
		self.saves.load(Ordering::Relaxed)
	}

	fn save_now(&self, token: Token) -> Result<(), StoreError> {
		*self.slot.write() = Some(token);

		self.saves.fetch_add(1, Ordering::Relaxed);

		Ok(())
	}
}
impl TokenStore for MemoryStore {
	fn save(&self, token: Token) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.save_now(token) })
	}

	fn load(&self) -> StoreFuture<'_, Option<Token>> {
		Box::pin(async move { Ok(self.snapshot()) })
	}
}
