//! Execution environment the wallet runs in.
//!
//! The wallet never moves value or runs foreign code itself; it asks its
//! `Environment` to. `InMemoryEnvironment` is a deterministic ledger of
//! native balances with pluggable `Contract` objects standing in for
//! deployed code, enough to drive the wallet end to end without a chain.

use safe_types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
	#[error("Insufficient balance: {account} has {available}, needs {required}")]
	InsufficientBalance {
		account: Address,
		available: U256,
		required: U256,
	},
	#[error("Call reverted: {0}")]
	Reverted(String),
	#[error("Unsupported operation: {0}")]
	Unsupported(String),
	#[error("Invalid environment state: {0}")]
	InvalidState(String),
}

/// Collaborators the wallet needs from its surroundings.
pub trait Environment: Send {
	fn chain_id(&self) -> u64;

	/// Current time in seconds.
	fn timestamp(&self) -> u64;

	/// Native balance of `account`.
	fn balance(&self, account: Address) -> U256;

	/// Moves native value without running code.
	fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), EnvironmentError>;

	/// Calls `to` as `caller`, sending `value` along.
	///
	/// On error nothing is changed, including the value transfer.
	fn call(
		&mut self,
		caller: Address,
		to: Address,
		value: U256,
		data: &[u8],
	) -> Result<Bytes, EnvironmentError>;

	/// Runs the code at `to` in the context of `caller`.
	fn delegate_call(
		&mut self,
		caller: Address,
		to: Address,
		data: &[u8],
	) -> Result<Bytes, EnvironmentError>;

	/// Deploys `init_code` on behalf of `creator` and returns the new address.
	fn create(
		&mut self,
		creator: Address,
		value: U256,
		init_code: &[u8],
	) -> Result<Address, EnvironmentError>;

	/// Read-only call to `to`.
	fn static_call(&self, to: Address, data: &[u8]) -> Result<Bytes, EnvironmentError>;
}

/// Code living at an address of an `InMemoryEnvironment`.
pub trait Contract: Send {
	/// Handles a call. Returning an error reverts the call.
	fn call(&mut self, caller: Address, value: U256, data: &[u8]) -> Result<Bytes, String>;

	fn static_call(&self, data: &[u8]) -> Result<Bytes, String>;

	/// Handles a call executed in the storage context of `caller`.
	fn delegate_call(&mut self, caller: Address, data: &[u8]) -> Result<Bytes, String> {
		let _ = (caller, data);
		Err("delegate call not supported".to_string())
	}
}

/// Serializable part of an `InMemoryEnvironment`.
///
/// Registered `Contract` objects are code, not state, and are not captured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentState {
	pub chain_id: u64,
	pub timestamp: u64,
	pub balances: BTreeMap<Address, U256>,
	/// Init code of accounts created through `create`.
	pub code: BTreeMap<Address, Bytes>,
	pub create_nonces: BTreeMap<Address, u64>,
}

/// Deterministic in-memory ledger.
pub struct InMemoryEnvironment {
	state: EnvironmentState,
	contracts: HashMap<Address, Box<dyn Contract>>,
}

impl InMemoryEnvironment {
	pub fn new(chain_id: u64) -> Self {
		Self::from_state(EnvironmentState {
			chain_id,
			timestamp: safe_types::current_timestamp(),
			..Default::default()
		})
	}

	pub fn from_state(state: EnvironmentState) -> Self {
		Self {
			state,
			contracts: HashMap::new(),
		}
	}

	/// Exports balances, clock and created code.
	pub fn export(&self) -> EnvironmentState {
		self.state.clone()
	}

	/// Credits native value to `account` out of thin air.
	pub fn deposit(&mut self, account: Address, value: U256) {
		let balance = self.state.balances.entry(account).or_default();
		*balance = balance.saturating_add(value);
	}

	/// Installs `contract` as the code at `address`.
	pub fn deploy_contract(&mut self, address: Address, contract: Box<dyn Contract>) {
		self.contracts.insert(address, contract);
	}

	pub fn set_timestamp(&mut self, timestamp: u64) {
		self.state.timestamp = timestamp;
	}

	pub fn advance_time(&mut self, seconds: u64) {
		self.state.timestamp = self.state.timestamp.saturating_add(seconds);
	}

	/// Whether code lives at `address`.
	pub fn has_code(&self, address: &Address) -> bool {
		self.contracts.contains_key(address) || self.state.code.contains_key(address)
	}

	fn debit(&mut self, account: Address, value: U256) -> Result<(), EnvironmentError> {
		let available = self.balance(account);
		let remaining = available
			.checked_sub(value)
			.ok_or(EnvironmentError::InsufficientBalance {
				account,
				available,
				required: value,
			})?;
		self.state.balances.insert(account, remaining);
		Ok(())
	}
}

impl Environment for InMemoryEnvironment {
	fn chain_id(&self) -> u64 {
		self.state.chain_id
	}

	fn timestamp(&self) -> u64 {
		self.state.timestamp
	}

	fn balance(&self, account: Address) -> U256 {
		self.state.balances.get(&account).copied().unwrap_or_default()
	}

	fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), EnvironmentError> {
		if value.is_zero() || from == to {
			return Ok(());
		}
		self.debit(from, value)?;
		self.deposit(to, value);
		Ok(())
	}

	fn call(
		&mut self,
		caller: Address,
		to: Address,
		value: U256,
		data: &[u8],
	) -> Result<Bytes, EnvironmentError> {
		self.transfer(caller, to, value)?;

		let Some(contract) = self.contracts.get_mut(&to) else {
			// Accounts without registered behaviour accept any call.
			return Ok(Bytes::new());
		};
		match contract.call(caller, value, data) {
			Ok(output) => Ok(output),
			Err(reason) => {
				self.transfer(to, caller, value)?;
				Err(EnvironmentError::Reverted(reason))
			},
		}
	}

	fn delegate_call(
		&mut self,
		caller: Address,
		to: Address,
		data: &[u8],
	) -> Result<Bytes, EnvironmentError> {
		match self.contracts.get_mut(&to) {
			Some(contract) => contract
				.delegate_call(caller, data)
				.map_err(EnvironmentError::Reverted),
			None => Ok(Bytes::new()),
		}
	}

	fn create(
		&mut self,
		creator: Address,
		value: U256,
		init_code: &[u8],
	) -> Result<Address, EnvironmentError> {
		let nonce = self.state.create_nonces.get(&creator).copied().unwrap_or_default();
		let address = creator.create(nonce);
		if self.has_code(&address) {
			return Err(EnvironmentError::Reverted(format!(
				"account {} already has code",
				address
			)));
		}
		self.transfer(creator, address, value)?;
		self.state.create_nonces.insert(creator, nonce + 1);
		self.state
			.code
			.insert(address, Bytes::copy_from_slice(init_code));
		Ok(address)
	}

	fn static_call(&self, to: Address, data: &[u8]) -> Result<Bytes, EnvironmentError> {
		match self.contracts.get(&to) {
			Some(contract) => contract.static_call(data).map_err(EnvironmentError::Reverted),
			None => Ok(Bytes::new()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	const ALICE: Address = address!("0x1000000000000000000000000000000000000000");
	const BOB: Address = address!("0x2000000000000000000000000000000000000000");

	struct Rejecting;

	impl Contract for Rejecting {
		fn call(&mut self, _caller: Address, _value: U256, _data: &[u8]) -> Result<Bytes, String> {
			Err("nope".to_string())
		}

		fn static_call(&self, _data: &[u8]) -> Result<Bytes, String> {
			Ok(Bytes::from_static(b"view"))
		}
	}

	#[test]
	fn test_transfer_requires_balance() {
		let mut env = InMemoryEnvironment::new(1);
		env.deposit(ALICE, U256::from(10u64));

		env.call(ALICE, BOB, U256::from(4u64), &[]).unwrap();
		assert_eq!(env.balance(ALICE), U256::from(6u64));
		assert_eq!(env.balance(BOB), U256::from(4u64));

		assert!(matches!(
			env.transfer(ALICE, BOB, U256::from(7u64)),
			Err(EnvironmentError::InsufficientBalance { .. })
		));
		assert_eq!(env.balance(ALICE), U256::from(6u64));
	}

	#[test]
	fn test_reverted_call_returns_value() {
		let mut env = InMemoryEnvironment::new(1);
		env.deposit(ALICE, U256::from(10u64));
		env.deploy_contract(BOB, Box::new(Rejecting));

		let result = env.call(ALICE, BOB, U256::from(3u64), b"data");
		assert_eq!(result, Err(EnvironmentError::Reverted("nope".to_string())));
		assert_eq!(env.balance(ALICE), U256::from(10u64));
		assert_eq!(env.balance(BOB), U256::ZERO);

		assert_eq!(
			env.static_call(BOB, &[]).unwrap(),
			Bytes::from_static(b"view")
		);
		assert!(env.delegate_call(ALICE, BOB, &[]).is_err());
	}

	#[test]
	fn test_create_derives_addresses_from_nonce() {
		let mut env = InMemoryEnvironment::new(1);
		let first = env.create(ALICE, U256::ZERO, b"code").unwrap();
		let second = env.create(ALICE, U256::ZERO, b"code").unwrap();
		assert_eq!(first, ALICE.create(0));
		assert_eq!(second, ALICE.create(1));
		assert!(env.has_code(&first));

		let restored = InMemoryEnvironment::from_state(env.export());
		assert_eq!(restored.export(), env.export());
	}

	#[test]
	fn test_clock_controls() {
		let mut env = InMemoryEnvironment::new(5);
		env.set_timestamp(100);
		env.advance_time(86_400);
		assert_eq!(env.timestamp(), 86_500);
		assert_eq!(env.chain_id(), 5);
	}
}
