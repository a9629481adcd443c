//! Registry trait for self-registering implementations.
//!
//! Modules, signers and storage backends each expose a `Registry` struct so
//! configuration can refer to them by name and the builder can construct
//! them without knowing the concrete type.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. "daily_limit" for `[modules.daily_limit]` or "file" for
	/// `[storage.implementations.file]`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
