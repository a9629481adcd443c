//! Capability handed to a hosted module while it runs.

use super::Safe;
use crate::environment::Environment;
use safe_types::{Address, Bytes, ExecutionOutcome, ModuleContext, Operation, SafeError, SafeEvent, U256};

/// `ModuleContext` bound to one hosted module of a wallet.
///
/// The module address is fixed by the wallet, so a module can only ever act
/// as itself.
pub struct WalletContext<'a, E: Environment> {
	safe: &'a mut Safe<E>,
	module: Address,
}

impl<'a, E: Environment> WalletContext<'a, E> {
	pub(crate) fn new(safe: &'a mut Safe<E>, module: Address) -> Self {
		Self { safe, module }
	}
}

impl<E: Environment> ModuleContext for WalletContext<'_, E> {
	fn wallet(&self) -> Address {
		self.safe.address()
	}

	fn module(&self) -> Address {
		self.module
	}

	fn chain_id(&self) -> u64 {
		self.safe.hasher().chain_id()
	}

	fn timestamp(&self) -> u64 {
		self.safe.env().timestamp()
	}

	fn execute_from_module(
		&mut self,
		to: Address,
		value: U256,
		data: Bytes,
		operation: Operation,
	) -> Result<ExecutionOutcome, SafeError> {
		self.safe
			.execute_from_module(self.module, to, value, data, operation)
	}

	fn emit(&mut self, event: SafeEvent) {
		self.safe.emit(event);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::SafeSetup;
	use crate::environment::InMemoryEnvironment;
	use crate::state::WalletSettings;
	use alloy_primitives::address;

	const WALLET: Address = address!("0x00000000000000000000000000000000000000aa");
	const OWNER: Address = address!("0x1111111111111111111111111111111111111111");
	const STRANGER: Address = address!("0x00000000000000000000000000000000000000dd");

	#[test]
	fn test_context_of_disabled_module_cannot_execute() {
		let mut env = InMemoryEnvironment::new(1);
		env.deposit(WALLET, U256::from(10u64));
		let mut safe = Safe::new(
			SafeSetup {
				address: WALLET,
				owners: vec![OWNER],
				threshold: 1,
				settings: WalletSettings::default(),
			},
			env,
		)
		.unwrap();

		let mut ctx = WalletContext::new(&mut safe, STRANGER);
		assert_eq!(ctx.module(), STRANGER);
		assert_eq!(
			ctx.execute_from_module(STRANGER, U256::from(1u64), Bytes::new(), Operation::Call),
			Err(SafeError::NotAModule(STRANGER))
		);
		assert_eq!(safe.env().balance(WALLET), U256::from(10u64));
	}
}
