//! Owner set and quorum threshold of a wallet.
//!
//! Owners are kept in list order: a newly added owner goes to the head and
//! removal keeps the relative order of the others. The registry never holds
//! the zero address, the sentinel or the wallet itself, never holds an owner
//! twice, and its threshold always lies in `1..=owners.len()`.

use safe_types::{Address, SENTINEL_ADDRESS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by owner management operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OwnerError {
	#[error("Invalid owner address: {0}")]
	InvalidOwner(Address),
	#[error("Address is already an owner: {0}")]
	DuplicateOwner(Address),
	#[error("Address is not an owner: {0}")]
	NotAnOwner(Address),
	#[error("Threshold {threshold} is invalid for {owners} owners")]
	InvalidThreshold { threshold: usize, owners: usize },
	#[error("Cannot remove the last owner")]
	LastOwner,
}

/// Ordered owner list with its threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRegistry {
	owners: Vec<Address>,
	threshold: usize,
}

impl OwnerRegistry {
	/// Creates a registry for the wallet at `wallet`.
	pub fn new(owners: Vec<Address>, threshold: usize, wallet: Address) -> Result<Self, OwnerError> {
		let mut registry = Self {
			owners: Vec::with_capacity(owners.len()),
			threshold: 0,
		};
		for owner in owners {
			registry.check_candidate(owner, wallet)?;
			registry.owners.push(owner);
		}
		registry.check_threshold(threshold, registry.owners.len())?;
		registry.threshold = threshold;
		Ok(registry)
	}

	pub fn owners(&self) -> &[Address] {
		&self.owners
	}

	pub fn threshold(&self) -> usize {
		self.threshold
	}

	pub fn is_owner(&self, address: &Address) -> bool {
		self.owners.contains(address)
	}

	pub fn len(&self) -> usize {
		self.owners.len()
	}

	pub fn is_empty(&self) -> bool {
		self.owners.is_empty()
	}

	/// Re-checks every invariant, for state loaded from outside.
	pub fn validate(&self, wallet: Address) -> Result<(), OwnerError> {
		Self::new(self.owners.clone(), self.threshold, wallet).map(|_| ())
	}

	/// Adds `owner` at the head of the list and sets the threshold.
	pub fn add_owner(
		&mut self,
		owner: Address,
		threshold: usize,
		wallet: Address,
	) -> Result<(), OwnerError> {
		self.check_candidate(owner, wallet)?;
		self.check_threshold(threshold, self.owners.len() + 1)?;
		self.owners.insert(0, owner);
		self.threshold = threshold;
		Ok(())
	}

	/// Removes `owner` and sets the threshold.
	///
	/// A threshold above the remaining owner count is lowered to that count.
	/// Returns the threshold that was applied.
	pub fn remove_owner(&mut self, owner: Address, threshold: usize) -> Result<usize, OwnerError> {
		let index = self
			.owners
			.iter()
			.position(|o| *o == owner)
			.ok_or(OwnerError::NotAnOwner(owner))?;
		if self.owners.len() == 1 {
			return Err(OwnerError::LastOwner);
		}
		let remaining = self.owners.len() - 1;
		if threshold == 0 {
			return Err(OwnerError::InvalidThreshold {
				threshold,
				owners: remaining,
			});
		}

		let applied = threshold.min(remaining);
		if applied != threshold {
			tracing::warn!(
				owner = %owner,
				requested = threshold,
				applied,
				"Requested threshold exceeds remaining owners, lowering it"
			);
		}
		self.owners.remove(index);
		self.threshold = applied;
		Ok(applied)
	}

	/// Replaces `old_owner` with `new_owner` at the same position.
	pub fn swap_owner(
		&mut self,
		old_owner: Address,
		new_owner: Address,
		wallet: Address,
	) -> Result<(), OwnerError> {
		self.check_candidate(new_owner, wallet)?;
		let slot = self
			.owners
			.iter_mut()
			.find(|o| **o == old_owner)
			.ok_or(OwnerError::NotAnOwner(old_owner))?;
		*slot = new_owner;
		Ok(())
	}

	pub fn change_threshold(&mut self, threshold: usize) -> Result<(), OwnerError> {
		self.check_threshold(threshold, self.owners.len())?;
		self.threshold = threshold;
		Ok(())
	}

	fn check_candidate(&self, owner: Address, wallet: Address) -> Result<(), OwnerError> {
		if owner == Address::ZERO || owner == SENTINEL_ADDRESS || owner == wallet {
			return Err(OwnerError::InvalidOwner(owner));
		}
		if self.is_owner(&owner) {
			return Err(OwnerError::DuplicateOwner(owner));
		}
		Ok(())
	}

	fn check_threshold(&self, threshold: usize, owners: usize) -> Result<(), OwnerError> {
		if threshold == 0 || threshold > owners {
			return Err(OwnerError::InvalidThreshold { threshold, owners });
		}
		Ok(())
	}
}
