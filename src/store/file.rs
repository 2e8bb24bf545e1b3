//! File-backed [`TokenStore`] mirroring the hub's versioned JSON storage records.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::Token,
	store::{STORAGE_KEY, StoreError, StoreFuture, StoredRecord, TokenStore},
};

/// Persists the token record to `<dir>/strava` after each change.
///
/// File I/O runs on tokio's blocking pool and writes are serialized, so the last completed
/// `save` is what the file holds.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Option<Token>>>,
	writer: Arc<AsyncMutex<()>>,
}
impl FileStore {
	/// Opens (or creates) the store inside `dir`, eagerly loading an existing record.
	pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
		Self::open_at(dir.as_ref().join(STORAGE_KEY))
	}

	/// Opens (or creates) the store at an explicit file path.
	pub fn open_at(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)), writer: Default::default() })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Option<Token>, StoreError> {
		if !path.exists() {
			return Ok(None);
		}

		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(None);
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;
		let record: StoredRecord =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		record.into_token().map(Some)
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist(path: &Path, token: &Token) -> Result<(), StoreError> {
		Self::ensure_parent_exists(path)?;

		let serialized = serde_json::to_vec_pretty(&StoredRecord::new(token.clone())).map_err(
			|e| StoreError::Serialization { message: format!("Failed to serialize token: {e}") },
		)?;
		let mut tmp_path = path.to_path_buf();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", path.display()),
		})
	}
}
impl TokenStore for FileStore {
	fn save(&self, token: Token) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let _writer = self.writer.lock().await;
			let path = self.path.clone();
			let record = token.clone();

			tokio::task::spawn_blocking(move || Self::persist(&path, &record)).await.map_err(
				|e| StoreError::Backend { message: format!("Store writer task failed: {e}") },
			)??;

			*self.inner.write() = Some(token);

			Ok(())
		})
	}

	fn load(&self) -> StoreFuture<'_, Option<Token>> {
		Box::pin(async move { Ok(self.inner.read().clone()) })
	}
}
