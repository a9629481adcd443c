//! Conversion utilities for values read from configuration and the CLI.
//!
//! Addresses and raw bytes are accepted with or without a "0x" prefix.
//! Amounts are accepted as decimal or "0x"-prefixed hex strings.

use super::formatting::without_0x_prefix;
use alloy_primitives::{hex, Address, Bytes, U256};
use std::str::FromStr;

/// Parses a 20-byte hex address.
pub fn parse_address(value: &str) -> Result<Address, String> {
	let raw = without_0x_prefix(value.trim());
	if raw.len() != 40 {
		return Err(format!(
			"Invalid address '{}': expected 40 hex characters, got {}",
			value,
			raw.len()
		));
	}
	Address::from_str(raw).map_err(|e| format!("Invalid address '{}': {}", value, e))
}

/// Parses an unsigned 256-bit amount.
pub fn parse_u256(value: &str) -> Result<U256, String> {
	let value = value.trim();
	let parsed = match value.strip_prefix("0x") {
		Some(hex_str) => U256::from_str_radix(hex_str, 16),
		None => U256::from_str_radix(value, 10),
	};
	parsed.map_err(|e| format!("Invalid amount '{}': {}", value, e))
}

/// Parses hex-encoded bytes; the empty string and "0x" give empty bytes.
pub fn parse_bytes(value: &str) -> Result<Bytes, String> {
	let raw = without_0x_prefix(value.trim());
	hex::decode(raw)
		.map(Bytes::from)
		.map_err(|e| format!("Invalid hex data '{}': {}", value, e))
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	#[test]
	fn test_parse_address() {
		let expected = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
		assert_eq!(
			parse_address("0x5fbdb2315678afecb367f032d93f642f64180aa3").unwrap(),
			expected
		);
		assert_eq!(
			parse_address("5fbdb2315678afecb367f032d93f642f64180aa3").unwrap(),
			expected
		);
		assert!(parse_address("0x1234").is_err());
		assert!(parse_address("0xzzzzb2315678afecb367f032d93f642f64180aa3").is_err());
	}

	#[test]
	fn test_parse_u256() {
		assert_eq!(parse_u256("100").unwrap(), U256::from(100u64));
		assert_eq!(parse_u256("0x64").unwrap(), U256::from(100u64));
		assert!(parse_u256("-1").is_err());
		assert!(parse_u256("ten").is_err());
	}

	#[test]
	fn test_parse_bytes() {
		assert!(parse_bytes("0x").unwrap().is_empty());
		assert!(parse_bytes("").unwrap().is_empty());
		assert_eq!(parse_bytes("0xa9059cbb").unwrap().len(), 4);
		assert!(parse_bytes("0xabc").is_err());
	}
}
