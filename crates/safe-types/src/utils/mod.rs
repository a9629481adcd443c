//! Utility functions for common type conversions and transformations.
//!
//! This module provides helper functions for parsing and formatting the
//! addresses, amounts and digests handled throughout the wallet system.

pub mod conversion;
pub mod eip712;
pub mod formatting;
pub mod helpers;

pub use conversion::{parse_address, parse_bytes, parse_u256};
pub use eip712::{compute_domain_hash, compute_final_digest, Eip712AbiEncoder, DOMAIN_TYPE};
pub use formatting::{truncate_id, with_0x_prefix, without_0x_prefix};
pub use helpers::{current_timestamp, day_index, SECONDS_PER_DAY};
