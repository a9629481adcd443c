//! Persistent state of a wallet.

use crate::approvals::ApprovalBook;
use crate::environment::EnvironmentState;
use crate::modules::ModuleRegistry;
use crate::owners::OwnerRegistry;
use safe_types::{Address, SafeError, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Switches changed through management transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSettings {
	/// Whether `DelegateCall` transactions may run.
	#[serde(default)]
	pub allow_delegate_call: bool,
}

/// Everything the wallet itself owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletState {
	pub address: Address,
	pub chain_id: u64,
	pub owners: OwnerRegistry,
	pub modules: ModuleRegistry,
	/// Nonce the next signature bundle must carry.
	pub nonce: U256,
	pub approvals: ApprovalBook,
	#[serde(default)]
	pub settings: WalletSettings,
}

impl WalletState {
	/// Checks the owner and module invariants of state loaded from outside.
	pub fn validate(&self) -> Result<(), SafeError> {
		self.owners
			.validate(self.address)
			.map_err(|e| SafeError::InvalidSetup(e.to_string()))?;
		self.modules
			.validate(self.address)
			.map_err(|e| SafeError::InvalidSetup(e.to_string()))
	}
}

/// Wallet state together with hosted module state and the ledger it runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
	pub state: WalletState,
	/// Private state of each hosted module, keyed by module address.
	pub modules: BTreeMap<Address, serde_json::Value>,
	pub environment: EnvironmentState,
}
