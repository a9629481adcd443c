//! Set of modules enabled on a wallet.
//!
//! Only enabled modules may perform operations through the wallet. The list
//! is ordered most-recently-enabled first.

use safe_types::{Address, SENTINEL_ADDRESS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleRegistryError {
	#[error("Invalid module address: {0}")]
	InvalidModule(Address),
	#[error("Module already enabled: {0}")]
	AlreadyEnabled(Address),
	#[error("Module not enabled: {0}")]
	NotEnabled(Address),
}

/// Ordered set of enabled module addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRegistry {
	enabled: Vec<Address>,
}

impl ModuleRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn modules(&self) -> &[Address] {
		&self.enabled
	}

	pub fn is_enabled(&self, module: &Address) -> bool {
		self.enabled.contains(module)
	}

	pub fn enable(&mut self, module: Address, wallet: Address) -> Result<(), ModuleRegistryError> {
		if module == Address::ZERO || module == SENTINEL_ADDRESS || module == wallet {
			return Err(ModuleRegistryError::InvalidModule(module));
		}
		if self.is_enabled(&module) {
			return Err(ModuleRegistryError::AlreadyEnabled(module));
		}
		self.enabled.insert(0, module);
		Ok(())
	}

	pub fn disable(&mut self, module: Address) -> Result<(), ModuleRegistryError> {
		let index = self
			.enabled
			.iter()
			.position(|m| *m == module)
			.ok_or(ModuleRegistryError::NotEnabled(module))?;
		self.enabled.remove(index);
		Ok(())
	}

	/// Re-checks the registry, for state loaded from outside.
	pub fn validate(&self, wallet: Address) -> Result<(), ModuleRegistryError> {
		let mut check = ModuleRegistry::new();
		for module in self.enabled.iter().rev() {
			check.enable(*module, wallet)?;
		}
		Ok(())
	}
}
