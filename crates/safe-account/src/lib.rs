//! Signing keys and signature recovery for the custody wallet.
//!
//! This crate provides the abstraction the operator console uses to hold an
//! owner's or operator's key and produce signatures over wallet digests, and
//! the stateless recovery that the engine uses to turn a signature back into
//! the signer's address.

use async_trait::async_trait;
use safe_types::{Address, ConfigSchema, ImplementationRegistry, Signature, B256};
use thiserror::Error;

pub mod verify;

pub use verify::{encode_signature, order_by_signer, parse_signature, recover_signer};

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// The signature bytes are malformed or recover no address.
	#[error("Invalid signature: {0}")]
	InvalidSignature(String),
	/// Error that occurs when interacting with the account implementation.
	#[error("Implementation error: {0}")]
	Implementation(String),
}

/// Interface of a key holder able to sign wallet digests.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Returns the configuration schema for this account implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Address derived from the held key.
	async fn address(&self) -> Result<Address, AccountError>;

	/// Signs a 32-byte digest without any additional prefixing.
	///
	/// Wallet and delegation digests are already domain separated, so they
	/// are signed as-is.
	async fn sign_hash(&self, digest: &B256) -> Result<Signature, AccountError>;
}

/// Type alias for account factory functions.
pub type AccountFactory = fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>;

/// Registry trait for account implementations.
pub trait AccountRegistry: ImplementationRegistry<Factory = AccountFactory> {}

/// Get all registered account implementations.
pub fn get_all_implementations() -> Vec<(&'static str, AccountFactory)> {
	use implementations::local;

	vec![(local::Registry::NAME, local::Registry::factory())]
}

/// Service that manages account operations.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	pub async fn get_address(&self) -> Result<Address, AccountError> {
		self.implementation.address().await
	}

	/// Signs `digest` and checks that the signature recovers the account's
	/// own address before returning it.
	pub async fn sign(&self, digest: &B256) -> Result<Signature, AccountError> {
		let signature = self.implementation.sign_hash(digest).await?;
		let expected = self.implementation.address().await?;
		let recovered = recover_signer(digest, &signature)?;
		if recovered != expected {
			return Err(AccountError::SigningFailed(format!(
				"signature recovers {} instead of {}",
				recovered, expected
			)));
		}
		tracing::debug!(signer = %expected, digest = %digest, "Signed digest");
		Ok(signature)
	}
}
