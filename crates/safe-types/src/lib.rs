//! Common types module for the custody wallet system.
//!
//! This module defines the core data types and structures shared by the
//! authorization engine, the extension modules and the operator service.
//! It provides a centralized location for shared types to ensure the
//! hashing rules, error taxonomy and event shapes stay consistent.

/// Errors shared by the wallet engine and its modules.
pub mod error;
/// Event types emitted by the wallet and its modules.
pub mod events;
/// Canonical transaction digests.
pub mod hashing;
/// Capability interface the wallet grants to hosted modules.
pub mod module;
/// Self-registering implementation registry.
pub mod registry;
/// Secret string wrapper for key material.
pub mod secret_string;
/// Storage namespaces for persisted data.
pub mod storage;
/// Transaction descriptors and execution outcomes.
pub mod transaction;
/// Utility functions for common type conversions.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

pub use alloy_primitives::{Address, Bytes, Signature, B256, U256};
pub use error::*;
pub use events::*;
pub use hashing::{AuthorizationFlow, TransactionHasher};
pub use module::ModuleContext;
pub use registry::*;
pub use secret_string::SecretString;
pub use storage::*;
pub use transaction::*;
pub use utils::{
	current_timestamp, day_index, parse_address, parse_bytes, parse_u256, truncate_id,
	with_0x_prefix, without_0x_prefix,
};
pub use validation::*;

/// Address used as the head marker of owner and module lists.
///
/// It can never be registered as an owner or a module.
pub const SENTINEL_ADDRESS: Address =
	alloy_primitives::address!("0x0000000000000000000000000000000000000001");

/// Asset identifier for the chain's native currency.
pub const NATIVE_ASSET: Address = Address::ZERO;
