//! Capability the wallet grants to a hosted module while it runs.
//!
//! A module never holds a reference to the wallet. Instead, for the duration
//! of one call, the wallet hands it a `ModuleContext` bound to the module's
//! own address. Everything the module may do to the wallet goes through this
//! trait, and the wallet re-checks the module's enablement on every request.

use crate::{ExecutionOutcome, Operation, SafeError, SafeEvent};
use alloy_primitives::{Address, Bytes, U256};

pub trait ModuleContext {
	/// Address of the wallet hosting the module.
	fn wallet(&self) -> Address;

	/// Address of the calling module, as bound by the wallet.
	fn module(&self) -> Address;

	fn chain_id(&self) -> u64;

	/// Current time of the execution environment, in seconds.
	fn timestamp(&self) -> u64;

	/// Performs an operation on the wallet's behalf without a quorum check.
	///
	/// Fails with `NotAModule` if the calling module is not enabled. A failed
	/// inner call is reported through the outcome, not as an error.
	fn execute_from_module(
		&mut self,
		to: Address,
		value: U256,
		data: Bytes,
		operation: Operation,
	) -> Result<ExecutionOutcome, SafeError>;

	/// Publishes an event on the wallet's bus.
	fn emit(&mut self, event: SafeEvent);
}
