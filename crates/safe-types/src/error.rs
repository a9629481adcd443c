//! Error taxonomy of the authorization engine.
//!
//! Every rejected wallet or module entry point reports exactly one of these
//! kinds. Authorization failures are raised before any state is touched, so a
//! rejected call leaves the wallet unchanged.

use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Errors returned by wallet and module entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SafeError {
	/// A recovered signer is not authorized, or a signature set is not
	/// strictly ordered by signer address.
	#[error("Invalid signature: {0}")]
	InvalidSignature(String),
	/// Fewer distinct owner approvals than the threshold.
	#[error("Not enough confirmations: have {have}, need {need}")]
	InsufficientApprovals { have: usize, need: usize },
	/// The digest was already executed.
	#[error("Safe transaction already executed")]
	AlreadyExecuted,
	/// The caller must be an owner for this entry point.
	#[error("Sender is not an owner: {0}")]
	NotAnOwner(Address),
	/// The caller must be an enabled module for this entry point.
	#[error("Method can only be called from an enabled module: {0}")]
	NotAModule(Address),
	/// The delegated withdrawal would exceed the asset's daily cap.
	#[error("Daily limit exceeded")]
	DailyLimitExceeded,
	/// The nonce does not match the expected next value.
	#[error("Invalid nonce: expected {expected}, got {got}")]
	InvalidNonce { expected: U256, got: U256 },
	/// The authorized operation's target call failed.
	#[error("Inner call failed: {0}")]
	InnerCallFailed(String),
	/// The operation kind is disabled on this wallet.
	#[error("Operation not permitted: {0}")]
	OperationNotPermitted(String),
	/// A delegated transfer is malformed.
	#[error("Invalid transfer: {0}")]
	InvalidTransfer(String),
	/// No hosted module of the requested type lives at the address.
	#[error("Module not found: {0}")]
	ModuleNotFound(Address),
	/// Wallet construction or restoration parameters are inconsistent.
	#[error("Invalid setup: {0}")]
	InvalidSetup(String),
}
