//! Builder for creating `Config` instances in code.
//!
//! Produces a single-owner wallet on the memory backend unless told
//! otherwise; handy for tests and for the `init` command that writes a fresh
//! configuration file.

use crate::{Config, StorageConfig, WalletConfig};
use safe_types::Address;
use std::collections::HashMap;

/// Builder for `Config`.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	wallet_id: String,
	address: Address,
	chain_id: u64,
	owners: Vec<Address>,
	threshold: usize,
	allow_delegate_call: bool,
	storage_primary: String,
	storage_implementations: HashMap<String, toml::Value>,
	modules: HashMap<String, toml::Value>,
}

impl ConfigBuilder {
	/// Creates a builder for the wallet at `address`.
	pub fn new(address: Address) -> Self {
		let mut storage_implementations = HashMap::new();
		storage_implementations.insert(
			"memory".to_string(),
			toml::Value::Table(toml::Table::new()),
		);
		Self {
			wallet_id: "test-wallet".to_string(),
			address,
			chain_id: 1,
			owners: Vec::new(),
			threshold: 1,
			allow_delegate_call: false,
			storage_primary: "memory".to_string(),
			storage_implementations,
			modules: HashMap::new(),
		}
	}

	/// Sets the wallet ID.
	pub fn wallet_id(mut self, id: impl Into<String>) -> Self {
		self.wallet_id = id.into();
		self
	}

	pub fn chain_id(mut self, chain_id: u64) -> Self {
		self.chain_id = chain_id;
		self
	}

	/// Sets the owner list and threshold.
	pub fn owners(mut self, owners: Vec<Address>, threshold: usize) -> Self {
		self.owners = owners;
		self.threshold = threshold;
		self
	}

	pub fn allow_delegate_call(mut self, allowed: bool) -> Self {
		self.allow_delegate_call = allowed;
		self
	}

	/// Selects the primary storage backend and its settings.
	pub fn storage(mut self, primary: impl Into<String>, settings: toml::Value) -> Self {
		let primary = primary.into();
		self.storage_implementations.insert(primary.clone(), settings);
		self.storage_primary = primary;
		self
	}

	/// Adds a module section.
	pub fn module(mut self, name: impl Into<String>, section: toml::Value) -> Self {
		self.modules.insert(name.into(), section);
		self
	}

	/// Builds the `Config` with the configured values.
	pub fn build(self) -> Config {
		Config {
			wallet: WalletConfig {
				id: self.wallet_id,
				address: self.address,
				chain_id: self.chain_id,
				owners: self.owners,
				threshold: self.threshold,
				allow_delegate_call: self.allow_delegate_call,
			},
			storage: StorageConfig {
				primary: self.storage_primary,
				implementations: self.storage_implementations,
			},
			modules: self.modules,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use safe_types::parse_address;

	#[test]
	fn test_built_config_round_trips_through_toml() {
		let wallet = parse_address("0x00000000000000000000000000000000000000aa").unwrap();
		let owner = parse_address("0x1111111111111111111111111111111111111111").unwrap();
		let config = ConfigBuilder::new(wallet)
			.wallet_id("ops")
			.owners(vec![owner], 1)
			.build();

		let rendered = toml::to_string(&config).unwrap();
		let parsed: Config = rendered.parse().unwrap();
		assert_eq!(parsed.wallet.id, "ops");
		assert_eq!(parsed.wallet.owners, vec![owner]);
		assert_eq!(parsed.storage.primary, "memory");
	}
}
