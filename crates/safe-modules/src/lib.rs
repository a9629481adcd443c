//! Extension modules hosted by the custody wallet.
//!
//! A module is a narrowly-scoped policy that may move the wallet's funds
//! without a full owner quorum. The wallet hosts each module, forwards to it
//! the quorum-approved calls addressed to its address, and hands it a
//! `ModuleContext` capability when an outside caller drives it. Whatever a
//! module does to the wallet goes through `ModuleContext::execute_from_module`,
//! which the wallet only honours while the module is enabled.

use safe_types::{
	Address, Bytes, ConfigSchema, ImplementationRegistry, ModuleContext, SafeError, U256,
};
use std::any::Any;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod daily_limit;
}

/// Errors that can occur while constructing or calling a module.
#[derive(Debug, Error)]
pub enum ModuleError {
	/// The module's configuration section is invalid.
	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),
	/// The call data does not select a function the module exposes.
	#[error("Unknown function selector: {0}")]
	UnknownFunction(String),
	/// The call data selects a known function but cannot be decoded.
	#[error("Invalid call data: {0}")]
	InvalidCallData(String),
	/// Module state could not be captured or restored.
	#[error("State error: {0}")]
	State(String),
	#[error(transparent)]
	Safe(#[from] SafeError),
}

/// Interface every hosted module implements.
pub trait SafeModule: Any + Send + Sync {
	/// Implementation name, as used in `[modules.<name>]`.
	fn name(&self) -> &'static str;

	/// Address at which the wallet hosts the module.
	fn address(&self) -> Address;

	/// Returns the configuration schema for this module implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Handles a quorum-approved call from the wallet addressed to this module.
	///
	/// An error makes the wallet report the inner call as failed; the module
	/// must leave its state untouched in that case.
	fn on_wallet_call(
		&mut self,
		ctx: &mut dyn ModuleContext,
		value: U256,
		data: &[u8],
	) -> Result<Bytes, ModuleError>;

	/// Captures the module's private state.
	fn snapshot(&self) -> Result<serde_json::Value, ModuleError>;

	/// Replaces the module's private state with a captured one.
	fn restore(&mut self, state: serde_json::Value) -> Result<(), ModuleError>;

	fn as_any(&self) -> &dyn Any;

	fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Type alias for module factory functions.
///
/// Receives the module's configuration section and the address of the wallet
/// that will host it.
pub type ModuleFactory = fn(&toml::Value, Address) -> Result<Box<dyn SafeModule>, ModuleError>;

/// Registry trait for module implementations.
pub trait SafeModuleRegistry: ImplementationRegistry<Factory = ModuleFactory> {}

/// Get all registered module implementations.
pub fn get_all_implementations() -> Vec<(&'static str, ModuleFactory)> {
	use implementations::daily_limit;

	vec![(daily_limit::Registry::NAME, daily_limit::Registry::factory())]
}
