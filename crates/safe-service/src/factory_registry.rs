//! Dynamic factory registry for wallet implementations.
//!
//! This module provides a centralized registry for all factory functions,
//! allowing dynamic instantiation of storage backends, signing accounts and
//! modules based on configuration.

use safe_account::{AccountFactory, AccountService};
use safe_config::Config;
use safe_core::{Safe, SafeBuilder, SafeFactories, WalletStore};
use safe_modules::ModuleFactory;
use safe_storage::StorageFactory;
use safe_types::{ImplementationRegistry, SecretString};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Global registry for all implementation factories
pub struct FactoryRegistry {
	pub storage: HashMap<String, StorageFactory>,
	pub account: HashMap<String, AccountFactory>,
	pub modules: HashMap<String, ModuleFactory>,
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			storage: HashMap::new(),
			account: HashMap::new(),
			modules: HashMap::new(),
		}
	}

	pub fn register_storage(&mut self, name: impl Into<String>, factory: StorageFactory) {
		self.storage.insert(name.into(), factory);
	}

	pub fn register_account(&mut self, name: impl Into<String>, factory: AccountFactory) {
		self.account.insert(name.into(), factory);
	}

	pub fn register_module(&mut self, name: impl Into<String>, factory: ModuleFactory) {
		self.modules.insert(name.into(), factory);
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Get the global factory registry, registering every implementation on
/// first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in safe_storage::get_all_implementations() {
			tracing::debug!("Registering storage implementation: {}", name);
			registry.register_storage(name, factory);
		}

		for (name, factory) in safe_account::get_all_implementations() {
			tracing::debug!("Registering account implementation: {}", name);
			registry.register_account(name, factory);
		}

		for (name, factory) in safe_modules::get_all_implementations() {
			tracing::debug!("Registering module implementation: {}", name);
			registry.register_module(name, factory);
		}

		registry
	})
}

/// Macro to build factories from config implementations
macro_rules! build_factories {
	($registry:expr, $config_impls:expr, $registry_field:ident, $type_name:literal) => {{
		let mut factories = HashMap::new();
		for name in $config_impls.keys() {
			if let Some(factory) = $registry.$registry_field.get(name) {
				factories.insert(name.clone(), *factory);
			} else {
				let available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				let available_str = available.join(", ");
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name, name, available_str
				)
				.into());
			}
		}
		factories
	}};
}

/// Opens the configured wallet with the registered implementations.
pub async fn open_wallet(
	config: Config,
) -> Result<(Safe, WalletStore), Box<dyn std::error::Error>> {
	let registry = get_registry();

	let storage_factories =
		build_factories!(registry, config.storage.implementations, storage, "storage");
	let module_factories = build_factories!(registry, config.modules, modules, "module");

	let factories = SafeFactories {
		storage_factories,
		module_factories,
	};
	Ok(SafeBuilder::new(config).open(factories).await?)
}

/// Creates a signing account from a private key.
pub fn local_account(private_key: &SecretString) -> Result<AccountService, Box<dyn std::error::Error>> {
	let registry = get_registry();
	let factory = registry
		.account
		.get(safe_account::implementations::local::Registry::NAME)
		.ok_or("local account implementation is not registered")?;

	let mut settings = toml::Table::new();
	settings.insert(
		"private_key".to_string(),
		toml::Value::String(private_key.expose_secret().to_string()),
	);
	let account = factory(&toml::Value::Table(settings))?;
	Ok(AccountService::new(account))
}
