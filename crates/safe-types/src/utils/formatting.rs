//! String formatting utilities.
//!
//! Provides functions for formatting digests and addresses for display,
//! including hex prefix management and truncation for log readability.

/// Truncates a hex string for display purposes.
///
/// Shows only the first 10 characters (`0x` plus four bytes) followed by "..".
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 10 {
		id.to_string()
	} else {
		format!("{}..", &id[..10])
	}
}

/// Adds "0x" prefix to a hex string if it doesn't already have one.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.to_lowercase().starts_with("0x") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Removes "0x" or "0X" prefix from a hex string if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("0x12345678"), "0x12345678");
		assert_eq!(
			truncate_id("0x8d3a4f1b2c9e7d6a5b4c3d2e1f0a9b8c7d6e5f4a3b2c1d0e9f8a7b6c5d4e3f2a"),
			"0x8d3a4f1b.."
		);
	}

	#[test]
	fn test_prefix_helpers() {
		assert_eq!(
			with_0x_prefix("5fbdb2315678afecb367f032d93f642f64180aa3"),
			"0x5fbdb2315678afecb367f032d93f642f64180aa3"
		);
		assert_eq!(with_0x_prefix("0X5fbdb231"), "0X5fbdb231");
		assert_eq!(without_0x_prefix("0x5fbdb231"), "5fbdb231");
		assert_eq!(without_0x_prefix("0X5fbdb231"), "5fbdb231");
		assert_eq!(without_0x_prefix("5fbdb231"), "5fbdb231");
	}
}
