//! Snapshot persistence on top of the storage service.

use crate::state::WalletSnapshot;
use safe_storage::{StorageError, StorageService};
use safe_types::StorageKey;
use std::sync::Arc;

/// Saves and loads wallet snapshots under `StorageKey::Wallets`.
#[derive(Clone)]
pub struct WalletStore {
	storage: Arc<StorageService>,
}

impl WalletStore {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	pub async fn save(&self, id: &str, snapshot: &WalletSnapshot) -> Result<(), StorageError> {
		self.storage
			.store(StorageKey::Wallets.as_str(), id, snapshot)
			.await?;
		tracing::debug!(wallet_id = %id, nonce = %snapshot.state.nonce, "Wallet snapshot saved");
		Ok(())
	}

	/// Loads the snapshot stored under `id`, if any.
	pub async fn load(&self, id: &str) -> Result<Option<WalletSnapshot>, StorageError> {
		self.storage
			.retrieve_optional(StorageKey::Wallets.as_str(), id)
			.await
	}

	pub async fn exists(&self, id: &str) -> Result<bool, StorageError> {
		self.storage.exists(StorageKey::Wallets.as_str(), id).await
	}
}
