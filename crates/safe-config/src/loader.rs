//! Multi-file configuration loading.
//!
//! Wallet, storage and module sections may live in separate files joined with
//! `include`. Included files may include further files. Each top-level section
//! must come from exactly one file, and no file may be read twice.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Reads a configuration file together with everything it includes.
pub struct ConfigLoader {
	/// Directory relative includes are resolved against.
	base_path: PathBuf,
	/// Canonical paths read so far.
	visited: HashSet<PathBuf>,
	/// File each top-level section was read from.
	owners: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			visited: HashSet::new(),
			owners: HashMap::new(),
		}
	}

	/// Loads `config_path` and its includes into one validated `Config`.
	pub async fn load_config(
		&mut self,
		config_path: impl AsRef<Path>,
	) -> Result<Config, ConfigError> {
		let mut merged = toml::Table::new();
		let mut pending = vec![self.locate(config_path.as_ref())?];

		while let Some(path) = pending.pop() {
			let mut table = self.read_table(&path).await?;
			for include in take_includes(&mut table)? {
				pending.push(self.locate(&include)?);
			}
			self.merge(&mut merged, table, &path)?;
		}

		let rendered = toml::to_string(&merged)
			.map_err(|e| ConfigError::Parse(format!("Failed to render merged configuration: {}", e)))?;
		rendered.parse()
	}

	/// Reads one file, resolving environment variables.
	async fn read_table(&mut self, path: &Path) -> Result<toml::Table, ConfigError> {
		let canonical = tokio::fs::canonicalize(path).await?;
		if !self.visited.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include: {} was already loaded",
				canonical.display()
			)));
		}

		let raw = tokio::fs::read_to_string(&canonical).await?;
		tracing::debug!(path = %canonical.display(), "Read configuration file");
		Ok(toml::from_str(&resolve_env_vars(&raw)?)?)
	}

	/// Moves the sections of `table` into `merged`, rejecting any section
	/// another file already defined.
	fn merge(
		&mut self,
		merged: &mut toml::Table,
		table: toml::Table,
		source: &Path,
	) -> Result<(), ConfigError> {
		for (section, value) in table {
			if let Some(first) = self.owners.get(&section) {
				return Err(ConfigError::Validation(format!(
					"Duplicate section '{}' in {} and {}",
					section,
					first.display(),
					source.display()
				)));
			}
			self.owners.insert(section.clone(), source.to_path_buf());
			merged.insert(section, value);
		}
		Ok(())
	}

	fn locate(&self, path: &Path) -> Result<PathBuf, ConfigError> {
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		};
		if !resolved.is_file() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}
		Ok(resolved)
	}
}

/// Removes and returns the `include` directive, a path or a list of paths.
fn take_includes(table: &mut toml::Table) -> Result<Vec<PathBuf>, ConfigError> {
	match table.remove("include") {
		None => Ok(Vec::new()),
		Some(toml::Value::String(path)) => Ok(vec![PathBuf::from(path)]),
		Some(toml::Value::Array(items)) => items
			.into_iter()
			.map(|item| match item {
				toml::Value::String(path) => Ok(PathBuf::from(path)),
				other => Err(ConfigError::Validation(format!(
					"include entries must be strings, got {}",
					other.type_str()
				))),
			})
			.collect(),
		Some(other) => Err(ConfigError::Validation(format!(
			"include must be a string or an array of strings, got {}",
			other.type_str()
		))),
	}
}
