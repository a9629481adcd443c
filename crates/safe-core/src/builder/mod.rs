//! Builder pattern for constructing wallets from configuration.
//!
//! Storage backends and modules are created through factory functions keyed
//! by implementation name, so the binary decides which implementations exist
//! and the configuration decides which are used.

use crate::engine::{Safe, SafeSetup};
use crate::environment::InMemoryEnvironment;
use crate::persistence::WalletStore;
use crate::state::WalletSettings;
use safe_config::Config;
use safe_modules::{ModuleError, SafeModule};
use safe_storage::{StorageError, StorageInterface, StorageService};
use safe_types::Address;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during wallet construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
	#[error("Storage error: {0}")]
	Storage(String),
}

/// Container for the factory functions needed to build a wallet.
pub struct SafeFactories<SF, MF> {
	pub storage_factories: HashMap<String, SF>,
	pub module_factories: HashMap<String, MF>,
}

/// A module built from configuration and whether to enable it at setup.
pub struct ConfiguredModule {
	pub module: Box<dyn SafeModule>,
	pub enabled: bool,
}

/// Builder for constructing a `Safe` with pluggable implementations.
pub struct SafeBuilder {
	config: Config,
}

impl SafeBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Creates the primary storage backend.
	pub fn build_storage<SF, MF>(
		&self,
		factories: &SafeFactories<SF, MF>,
	) -> Result<StorageService, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let primary = &self.config.storage.primary;
		let settings = self
			.config
			.storage
			.implementations
			.get(primary)
			.ok_or_else(|| {
				BuilderError::Config(format!("Primary storage '{}' is not configured", primary))
			})?;
		let factory = factories.storage_factories.get(primary).ok_or_else(|| {
			BuilderError::MissingComponent(format!("storage implementation '{}'", primary))
		})?;

		match factory(settings) {
			Ok(backend) => {
				tracing::info!(component = "storage", implementation = %primary, "Loaded");
				Ok(StorageService::new(backend))
			},
			Err(e) => {
				tracing::error!(
					component = "storage",
					implementation = %primary,
					error = %e,
					"Failed to create storage implementation"
				);
				Err(BuilderError::Config(format!(
					"Failed to create storage implementation '{}': {}",
					primary, e
				)))
			},
		}
	}

	/// Creates every module with a `[modules.<name>]` section.
	pub fn build_modules<SF, MF>(
		&self,
		factories: &SafeFactories<SF, MF>,
	) -> Result<Vec<ConfiguredModule>, BuilderError>
	where
		MF: Fn(&toml::Value, Address) -> Result<Box<dyn SafeModule>, ModuleError>,
	{
		let wallet = self.config.wallet.address;
		let mut names: Vec<&String> = self.config.modules.keys().collect();
		names.sort();

		let mut modules = Vec::with_capacity(names.len());
		for name in names {
			let section = &self.config.modules[name];
			let factory = factories.module_factories.get(name).ok_or_else(|| {
				BuilderError::MissingComponent(format!("module implementation '{}'", name))
			})?;
			let module = factory(section, wallet).map_err(|e| {
				tracing::error!(component = "module", implementation = %name, error = %e, "Failed to create module");
				BuilderError::Config(format!("Failed to create module '{}': {}", name, e))
			})?;
			let enabled = section
				.get("enabled")
				.and_then(|v| v.as_bool())
				.unwrap_or(true);
			tracing::info!(
				component = "module",
				implementation = %name,
				address = %module.address(),
				enabled,
				"Loaded"
			);
			modules.push(ConfiguredModule { module, enabled });
		}
		Ok(modules)
	}

	/// Sets up a fresh wallet from the `[wallet]` section.
	pub fn build_wallet(
		&self,
		modules: Vec<ConfiguredModule>,
		env: InMemoryEnvironment,
	) -> Result<Safe, BuilderError> {
		let wallet = &self.config.wallet;
		let setup = SafeSetup {
			address: wallet.address,
			owners: wallet.owners.clone(),
			threshold: wallet.threshold,
			settings: WalletSettings {
				allow_delegate_call: wallet.allow_delegate_call,
			},
		};
		let mut safe = Safe::new(setup, env).map_err(|e| BuilderError::Config(e.to_string()))?;
		for configured in modules {
			safe.install_module(configured.module, configured.enabled)
				.map_err(|e| BuilderError::Config(e.to_string()))?;
		}
		Ok(safe)
	}

	/// Opens the configured wallet: restores the stored snapshot, or sets up
	/// a fresh wallet when none exists yet.
	pub async fn open<SF, MF>(
		self,
		factories: SafeFactories<SF, MF>,
	) -> Result<(Safe, WalletStore), BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		MF: Fn(&toml::Value, Address) -> Result<Box<dyn SafeModule>, ModuleError>,
	{
		let store = WalletStore::new(Arc::new(self.build_storage(&factories)?));
		let modules = self.build_modules(&factories)?;
		let id = &self.config.wallet.id;

		let snapshot = store
			.load(id)
			.await
			.map_err(|e| BuilderError::Storage(e.to_string()))?;
		let safe = match snapshot {
			Some(snapshot) => {
				if snapshot.state.address != self.config.wallet.address {
					return Err(BuilderError::Config(format!(
						"Stored wallet '{}' is at {}, configuration says {}",
						id, snapshot.state.address, self.config.wallet.address
					)));
				}
				let modules = modules.into_iter().map(|m| m.module).collect();
				Safe::restore(snapshot, modules).map_err(|e| BuilderError::Config(e.to_string()))?
			},
			None => {
				tracing::info!(wallet_id = %id, "No stored wallet, setting up from configuration");
				let env = InMemoryEnvironment::new(self.config.wallet.chain_id);
				self.build_wallet(modules, env)?
			},
		};
		Ok((safe, store))
	}
}
