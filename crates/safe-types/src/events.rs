//! Event types emitted by the wallet and its modules.
//!
//! Events are published on the wallet's event bus after each state change so
//! observers (the operator console, tests, audit sinks) can follow what the
//! engine did without polling its state.

use crate::ExecutionOutcome;
use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Main event type encompassing all wallet events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafeEvent {
	/// An owner recorded an approval for a digest.
	Approval { digest: B256, approver: Address },
	/// An authorized transaction ran and its inner call succeeded.
	ExecutionSuccess {
		digest: B256,
		outcome: ExecutionOutcome,
	},
	/// An authorized transaction ran and its inner call failed.
	ExecutionFailure { digest: B256, reason: String },
	/// A module operation succeeded.
	ExecutionFromModuleSuccess { module: Address },
	/// A module operation's inner call failed.
	ExecutionFromModuleFailure { module: Address },
	OwnerAdded { owner: Address },
	OwnerRemoved { owner: Address },
	OwnerSwapped { old_owner: Address, new_owner: Address },
	ThresholdChanged { threshold: usize },
	ModuleEnabled { module: Address },
	ModuleDisabled { module: Address },
	/// The delegate-call setting was toggled.
	DelegateCallAllowed { allowed: bool },
	/// A daily cap was set or updated.
	DailyLimitChanged {
		module: Address,
		asset: Address,
		limit: U256,
	},
	/// The delegated signer of a spending-limit module changed.
	OperatorChanged { module: Address, operator: Address },
	/// A delegated withdrawal was charged against a daily cap.
	DelegatedWithdrawal {
		module: Address,
		asset: Address,
		amount: U256,
		to: Address,
	},
}

impl SafeEvent {
	/// Short name used as a log field.
	pub fn kind(&self) -> &'static str {
		match self {
			SafeEvent::Approval { .. } => "approval",
			SafeEvent::ExecutionSuccess { .. } => "execution_success",
			SafeEvent::ExecutionFailure { .. } => "execution_failure",
			SafeEvent::ExecutionFromModuleSuccess { .. } => "execution_from_module_success",
			SafeEvent::ExecutionFromModuleFailure { .. } => "execution_from_module_failure",
			SafeEvent::OwnerAdded { .. } => "owner_added",
			SafeEvent::OwnerRemoved { .. } => "owner_removed",
			SafeEvent::OwnerSwapped { .. } => "owner_swapped",
			SafeEvent::ThresholdChanged { .. } => "threshold_changed",
			SafeEvent::ModuleEnabled { .. } => "module_enabled",
			SafeEvent::ModuleDisabled { .. } => "module_disabled",
			SafeEvent::DelegateCallAllowed { .. } => "delegate_call_allowed",
			SafeEvent::DailyLimitChanged { .. } => "daily_limit_changed",
			SafeEvent::OperatorChanged { .. } => "operator_changed",
			SafeEvent::DelegatedWithdrawal { .. } => "delegated_withdrawal",
		}
	}
}
