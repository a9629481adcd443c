//! Configuration module for the custody wallet service.
//!
//! This module provides structures and utilities for managing wallet
//! configuration. It supports loading configuration from TOML files and
//! provides validation to ensure the owner set, threshold and storage backend
//! are consistent before anything is built from them.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files for better organization:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

pub mod builders;
mod loader;

pub use loader::ConfigLoader;

use regex::Regex;
use safe_types::{Address, SENTINEL_ADDRESS};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for a custody wallet.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity, owners and quorum of the wallet.
	pub wallet: WalletConfig,
	/// Configuration for the snapshot storage backend.
	pub storage: StorageConfig,
	/// Module sections keyed by implementation name.
	///
	/// Each section is validated by the module implementation's own schema
	/// when the module is built.
	#[serde(default)]
	pub modules: HashMap<String, toml::Value>,
}

/// Setup parameters of the wallet.
///
/// Only used when no snapshot exists yet; afterwards the owner set and
/// threshold change through authorized transactions and the persisted
/// snapshot is authoritative.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WalletConfig {
	/// Identifier under which the wallet snapshot is stored.
	pub id: String,
	/// Address of the wallet account.
	pub address: Address,
	/// Chain the wallet's digests are bound to.
	#[serde(default = "default_chain_id")]
	pub chain_id: u64,
	/// Initial owners, in list order.
	pub owners: Vec<Address>,
	/// Initial number of approvals required.
	pub threshold: usize,
	/// Whether `DelegateCall` transactions are accepted.
	#[serde(default)]
	pub allow_delegate_call: bool,
}

fn default_chain_id() -> u64 {
	1
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let var_name = var_name.as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)))
				},
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file with environment variable resolution.
	///
	/// Each top-level section must be unique across all configuration files.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration.
	///
	/// - Wallet id is not empty
	/// - Owners are non-empty, unique, and none is the zero address, the
	///   sentinel or the wallet itself
	/// - Threshold lies within 1..=owners
	/// - The primary storage backend is configured
	fn validate(&self) -> Result<(), ConfigError> {
		let wallet = &self.wallet;
		if wallet.id.trim().is_empty() {
			return Err(ConfigError::Validation("Wallet ID cannot be empty".into()));
		}
		if wallet.address == Address::ZERO || wallet.address == SENTINEL_ADDRESS {
			return Err(ConfigError::Validation(format!(
				"Wallet address {} is reserved",
				wallet.address
			)));
		}

		if wallet.owners.is_empty() {
			return Err(ConfigError::Validation(
				"At least one owner must be configured".into(),
			));
		}
		let mut seen = HashSet::new();
		for owner in &wallet.owners {
			if *owner == Address::ZERO || *owner == SENTINEL_ADDRESS || *owner == wallet.address {
				return Err(ConfigError::Validation(format!(
					"Owner {} is not a valid owner address",
					owner
				)));
			}
			if !seen.insert(*owner) {
				return Err(ConfigError::Validation(format!(
					"Owner {} is listed more than once",
					owner
				)));
			}
		}
		if wallet.threshold == 0 {
			return Err(ConfigError::Validation(
				"Threshold must be at least 1".into(),
			));
		}
		if wallet.threshold > wallet.owners.len() {
			return Err(ConfigError::Validation(format!(
				"Threshold {} exceeds owner count {}",
				wallet.threshold,
				wallet.owners.len()
			)));
		}

		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}

		for (name, section) in &self.modules {
			if !section.is_table() {
				return Err(ConfigError::Validation(format!(
					"Module section '{}' must be a table",
					name
				)));
			}
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string, resolving environment variables
/// first and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
