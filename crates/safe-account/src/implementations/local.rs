//! Account implementation backed by a private key held in memory.

use crate::{AccountError, AccountFactory, AccountInterface, AccountRegistry};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use safe_types::{
	Address, ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, SecretString,
	Signature, ValidationError, B256,
};

/// Signer over a local secp256k1 key.
#[derive(Debug, Clone)]
pub struct LocalWallet {
	signer: PrivateKeySigner,
}

impl LocalWallet {
	/// Creates a wallet from a hex private key, with or without "0x".
	pub fn new(private_key: &SecretString) -> Result<Self, AccountError> {
		if !private_key.is_hex_key() {
			return Err(AccountError::InvalidKey(
				"private key must be 32 bytes of hex".to_string(),
			));
		}
		let signer: PrivateKeySigner = private_key.with_exposed(|key| {
			key.parse()
				.map_err(|e| AccountError::InvalidKey(format!("{}", e)))
		})?;
		Ok(Self { signer })
	}

	/// Creates a wallet with a freshly generated key.
	pub fn random() -> Self {
		Self {
			signer: PrivateKeySigner::random(),
		}
	}

	pub fn address_sync(&self) -> Address {
		self.signer.address()
	}

	/// Signs a digest without going through the async interface.
	pub fn sign_digest(&self, digest: &B256) -> Result<Signature, AccountError> {
		self.signer
			.sign_hash_sync(digest)
			.map_err(|e| AccountError::SigningFailed(e.to_string()))
	}
}

/// Configuration schema for local accounts.
pub struct LocalWalletSchema;

impl ConfigSchema for LocalWalletSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("private_key", FieldType::String).with_validator(|value| {
				let key = SecretString::from(value.as_str().unwrap_or_default());
				if key.is_hex_key() {
					Ok(())
				} else {
					Err("must be a 64 character hex string".to_string())
				}
			})],
			vec![],
		);
		schema.validate(config)
	}
}

#[async_trait]
impl AccountInterface for LocalWallet {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalWalletSchema)
	}

	async fn address(&self) -> Result<Address, AccountError> {
		Ok(self.signer.address())
	}

	async fn sign_hash(&self, digest: &B256) -> Result<Signature, AccountError> {
		self.sign_digest(digest)
	}
}

/// Factory function to create a local account from configuration.
///
/// Configuration parameters:
/// - `private_key`: hex-encoded secp256k1 key
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	LocalWalletSchema
		.validate(config)
		.map_err(|e| AccountError::InvalidKey(format!("Invalid configuration: {}", e)))?;

	let private_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.map(SecretString::from)
		.ok_or_else(|| AccountError::InvalidKey("private_key is required".to_string()))?;

	Ok(Box::new(LocalWallet::new(&private_key)?))
}

/// Registry for the local account implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = AccountFactory;

	fn factory() -> Self::Factory {
		create_account
	}
}

impl AccountRegistry for Registry {}
