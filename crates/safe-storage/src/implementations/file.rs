//! File-based storage backend.
//!
//! Each key is stored in its own file under the configured directory. Files
//! start with a fixed-size header carrying a keccak256 checksum of the
//! payload, so a truncated or edited snapshot is reported as corrupted rather
//! than silently loaded. Writes go to a temporary file that is then renamed
//! over the target.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use alloy_primitives::{keccak256, B256};
use async_trait::async_trait;
use safe_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use std::path::PathBuf;
use tokio::fs;

#[allow(clippy::doc_nested_refdefs)]
/// Fixed-size file header.
///
/// Binary layout (64 bytes total):
/// - [0-3]: Magic bytes "SAFE"
/// - [4-5]: Version (u16, little-endian)
/// - [6-13]: Payload length (u64, little-endian)
/// - [14-45]: keccak256 of the payload
/// - [46-63]: Reserved, zero
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileHeader {
	version: u16,
	payload_len: u64,
	checksum: B256,
}

impl FileHeader {
	const MAGIC: &'static [u8; 4] = b"SAFE";
	const VERSION: u16 = 1;
	const SIZE: usize = 64;

	fn for_payload(payload: &[u8]) -> Self {
		Self {
			version: Self::VERSION,
			payload_len: payload.len() as u64,
			checksum: keccak256(payload),
		}
	}

	fn serialize(&self) -> [u8; Self::SIZE] {
		let mut bytes = [0u8; Self::SIZE];
		bytes[0..4].copy_from_slice(Self::MAGIC);
		bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
		bytes[6..14].copy_from_slice(&self.payload_len.to_le_bytes());
		bytes[14..46].copy_from_slice(self.checksum.as_slice());
		bytes
	}

	fn deserialize(bytes: &[u8]) -> Result<Self, StorageError> {
		if bytes.len() < Self::SIZE {
			return Err(StorageError::Corrupted("file too small for header".into()));
		}
		if &bytes[0..4] != Self::MAGIC {
			return Err(StorageError::Corrupted("bad magic bytes".into()));
		}

		let version = u16::from_le_bytes([bytes[4], bytes[5]]);
		if version > Self::VERSION {
			return Err(StorageError::Backend(format!(
				"Unsupported file version: {}",
				version
			)));
		}

		let mut len_bytes = [0u8; 8];
		len_bytes.copy_from_slice(&bytes[6..14]);

		Ok(Self {
			version,
			payload_len: u64::from_le_bytes(len_bytes),
			checksum: B256::from_slice(&bytes[14..46]),
		})
	}

	/// Checks `payload` against the recorded length and checksum.
	fn verify(&self, payload: &[u8]) -> Result<(), StorageError> {
		if payload.len() as u64 != self.payload_len {
			return Err(StorageError::Corrupted(format!(
				"expected {} payload bytes, found {}",
				self.payload_len,
				payload.len()
			)));
		}
		if keccak256(payload) != self.checksum {
			return Err(StorageError::Corrupted("checksum mismatch".into()));
		}
		Ok(())
	}
}

/// File-based storage implementation.
pub struct FileStorage {
	base_path: PathBuf,
}

impl FileStorage {
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Converts a storage key to a filesystem-safe file path.
	fn get_file_path(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', ':', '\\'], "_");
		self.base_path.join(format!("{}.bin", safe_key))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);

		let data = match fs::read(&path).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(StorageError::NotFound)
			},
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let header = FileHeader::deserialize(&data)?;
		let payload = &data[FileHeader::SIZE..];
		if let Err(e) = header.verify(payload) {
			tracing::error!(path = ?path, error = %e, "Stored entry failed integrity check");
			return Err(e);
		}
		Ok(payload.to_vec())
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let header = FileHeader::for_payload(&value);
		let mut file_data = Vec::with_capacity(FileHeader::SIZE + value.len());
		file_data.extend_from_slice(&header.serialize());
		file_data.extend_from_slice(&value);

		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, file_data)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		tracing::debug!(path = ?path, bytes = value.len(), "Stored entry");
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		fs::try_exists(self.get_file_path(key))
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("storage_path", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(path) if path.trim().is_empty() => {
							Err("storage_path cannot be empty".to_string())
						},
						_ => Ok(()),
					}
				}),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for snapshot files (default: "./data/wallets")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/wallets");

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}
