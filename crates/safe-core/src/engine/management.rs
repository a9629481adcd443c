//! Management interface the wallet exposes to calls addressed to itself.
//!
//! Owner, threshold, module and setting changes are ordinary authorized
//! transactions whose target is the wallet. A call that cannot be decoded or
//! whose arguments break an invariant fails without changing anything.

use super::Safe;
use crate::environment::Environment;
use crate::modules::ModuleRegistryError;
use crate::owners::OwnerError;
use alloy_primitives::hex;
use alloy_sol_types::{sol, SolCall};
use safe_types::{Bytes, SafeEvent, U256};
use thiserror::Error;

sol! {
	/// Self-management entry points of the wallet.
	interface ISafeManager {
		function addOwnerWithThreshold(address owner, uint256 threshold) external;
		function removeOwner(address owner, uint256 threshold) external;
		function swapOwner(address oldOwner, address newOwner) external;
		function changeThreshold(uint256 threshold) external;
		function enableModule(address module) external;
		function disableModule(address module) external;
		function setDelegateCallAllowed(bool allowed) external;
	}
}

pub use ISafeManager::{
	addOwnerWithThresholdCall, changeThresholdCall, disableModuleCall, enableModuleCall,
	removeOwnerCall, setDelegateCallAllowedCall, swapOwnerCall,
};

#[derive(Debug, Error)]
pub enum ManagementError {
	#[error("Unknown management function: {0}")]
	UnknownFunction(String),
	#[error("Invalid management call data: {0}")]
	InvalidCallData(String),
	#[error(transparent)]
	Owners(#[from] OwnerError),
	#[error(transparent)]
	Modules(#[from] ModuleRegistryError),
}

fn decode<C: SolCall>(data: &[u8]) -> Result<C, ManagementError> {
	C::abi_decode(data).map_err(|e| ManagementError::InvalidCallData(e.to_string()))
}

fn threshold_arg(threshold: U256) -> Result<usize, ManagementError> {
	usize::try_from(threshold)
		.map_err(|_| ManagementError::InvalidCallData(format!("threshold {} out of range", threshold)))
}

/// Applies the management call in `data` to `safe`.
pub(super) fn dispatch<E: Environment>(
	safe: &mut Safe<E>,
	data: &[u8],
) -> Result<Bytes, ManagementError> {
	let Some(selector) = data.get(..4) else {
		// Plain value sent to the wallet itself.
		if data.is_empty() {
			return Ok(Bytes::new());
		}
		return Err(ManagementError::InvalidCallData(
			"missing function selector".to_string(),
		));
	};
	let wallet = safe.state.address;
	let previous_threshold = safe.state.owners.threshold();

	if selector == addOwnerWithThresholdCall::SELECTOR {
		let call: addOwnerWithThresholdCall = decode(data)?;
		let threshold = threshold_arg(call.threshold)?;
		safe.state.owners.add_owner(call.owner, threshold, wallet)?;
		tracing::info!(wallet = %wallet, owner = %call.owner, "Owner added");
		safe.emit(SafeEvent::OwnerAdded { owner: call.owner });
	} else if selector == removeOwnerCall::SELECTOR {
		let call: removeOwnerCall = decode(data)?;
		let threshold = threshold_arg(call.threshold)?;
		safe.state.owners.remove_owner(call.owner, threshold)?;
		// Approvals by the removed owner stay recorded but no longer count.
		tracing::info!(wallet = %wallet, owner = %call.owner, "Owner removed");
		safe.emit(SafeEvent::OwnerRemoved { owner: call.owner });
	} else if selector == swapOwnerCall::SELECTOR {
		let call: swapOwnerCall = decode(data)?;
		safe.state
			.owners
			.swap_owner(call.oldOwner, call.newOwner, wallet)?;
		tracing::info!(wallet = %wallet, old = %call.oldOwner, new = %call.newOwner, "Owner swapped");
		safe.emit(SafeEvent::OwnerSwapped {
			old_owner: call.oldOwner,
			new_owner: call.newOwner,
		});
	} else if selector == changeThresholdCall::SELECTOR {
		let call: changeThresholdCall = decode(data)?;
		let threshold = threshold_arg(call.threshold)?;
		safe.state.owners.change_threshold(threshold)?;
	} else if selector == enableModuleCall::SELECTOR {
		let call: enableModuleCall = decode(data)?;
		safe.state.modules.enable(call.module, wallet)?;
		tracing::info!(wallet = %wallet, module = %call.module, "Module enabled");
		safe.emit(SafeEvent::ModuleEnabled {
			module: call.module,
		});
	} else if selector == disableModuleCall::SELECTOR {
		let call: disableModuleCall = decode(data)?;
		safe.state.modules.disable(call.module)?;
		tracing::info!(wallet = %wallet, module = %call.module, "Module disabled");
		safe.emit(SafeEvent::ModuleDisabled {
			module: call.module,
		});
	} else if selector == setDelegateCallAllowedCall::SELECTOR {
		let call: setDelegateCallAllowedCall = decode(data)?;
		safe.state.settings.allow_delegate_call = call.allowed;
		tracing::info!(wallet = %wallet, allowed = call.allowed, "Delegate call setting changed");
		safe.emit(SafeEvent::DelegateCallAllowed {
			allowed: call.allowed,
		});
	} else {
		return Err(ManagementError::UnknownFunction(hex::encode_prefixed(
			selector,
		)));
	}

	let threshold = safe.state.owners.threshold();
	if threshold != previous_threshold {
		tracing::info!(wallet = %wallet, threshold, "Threshold changed");
		safe.emit(SafeEvent::ThresholdChanged { threshold });
	}
	Ok(Bytes::new())
}
