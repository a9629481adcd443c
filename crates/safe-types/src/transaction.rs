//! Transaction descriptors for the custody wallet.
//!
//! A `SafeTransaction` is the immutable description of one operation the
//! wallet performs once authorized. Its `nonce` means different things per
//! authorization flow: the wallet's sequential nonce for signature bundles, a
//! caller-chosen value for on-chain approvals.

use crate::SafeError;
use alloy_primitives::ruint::UintTryFrom;
use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of operation the wallet performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Operation {
	/// Ordinary call, optionally carrying value.
	#[default]
	Call = 0,
	/// Call executed in the wallet's own storage context.
	DelegateCall = 1,
	/// Deployment of new code; the created address is returned.
	Create = 2,
}

impl Operation {
	/// Returns the numeric encoding used in digests.
	pub fn as_u8(&self) -> u8 {
		*self as u8
	}
}

impl TryFrom<u8> for Operation {
	type Error = SafeError;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			0 => Ok(Self::Call),
			1 => Ok(Self::DelegateCall),
			2 => Ok(Self::Create),
			other => Err(SafeError::OperationNotPermitted(format!(
				"unknown operation kind {}",
				other
			))),
		}
	}
}

impl FromStr for Operation {
	type Err = SafeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"call" | "0" => Ok(Self::Call),
			"delegate_call" | "delegatecall" | "1" => Ok(Self::DelegateCall),
			"create" | "2" => Ok(Self::Create),
			other => Err(SafeError::OperationNotPermitted(format!(
				"unknown operation kind '{}'",
				other
			))),
		}
	}
}

impl fmt::Display for Operation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Operation::Call => write!(f, "call"),
			Operation::DelegateCall => write!(f, "delegate_call"),
			Operation::Create => write!(f, "create"),
		}
	}
}

/// Descriptor of a wallet transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeTransaction {
	/// Target of the call; ignored for `Create`.
	pub to: Address,
	/// Native value sent along.
	pub value: U256,
	/// Call data, or init code for `Create`.
	pub data: Bytes,
	/// Operation kind.
	pub operation: Operation,
	/// Flow-specific nonce.
	pub nonce: U256,
}

impl SafeTransaction {
	/// Creates a `Call` transaction with a zero nonce.
	pub fn call(to: Address, value: U256, data: impl Into<Bytes>) -> Self {
		Self {
			to,
			value,
			data: data.into(),
			operation: Operation::Call,
			nonce: U256::ZERO,
		}
	}

	/// Returns the transaction with the given nonce.
	pub fn with_nonce<T>(mut self, nonce: T) -> Self
	where
		U256: UintTryFrom<T>,
	{
		self.nonce = U256::from(nonce);
		self
	}

	/// Returns the transaction with the given operation kind.
	pub fn with_operation(mut self, operation: Operation) -> Self {
		self.operation = operation;
		self
	}
}

/// Result of performing an authorized operation.
///
/// The inner call failing does not reject the transaction: the digest or
/// nonce is still consumed and `success` reports the failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
	/// Whether the inner call succeeded.
	pub success: bool,
	/// Data returned by the inner call.
	pub return_data: Bytes,
	/// Address created by a `Create` operation.
	pub created: Option<Address>,
	/// Failure reason when `success` is false.
	pub error: Option<String>,
}

impl ExecutionOutcome {
	/// Successful call returning `data`.
	pub fn succeeded(return_data: Bytes) -> Self {
		Self {
			success: true,
			return_data,
			created: None,
			error: None,
		}
	}

	/// Successful deployment at `address`.
	pub fn created(address: Address) -> Self {
		Self {
			success: true,
			return_data: Bytes::new(),
			created: Some(address),
			error: None,
		}
	}

	/// Failed inner call.
	pub fn failed(reason: impl Into<String>) -> Self {
		Self {
			success: false,
			return_data: Bytes::new(),
			created: None,
			error: Some(reason.into()),
		}
	}

	/// Converts a soft failure into `SafeError::InnerCallFailed`.
	pub fn into_result(self) -> Result<Self, SafeError> {
		if self.success {
			Ok(self)
		} else {
			Err(SafeError::InnerCallFailed(
				self.error.unwrap_or_else(|| "unknown".to_string()),
			))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_operation_parsing() {
		assert_eq!("call".parse::<Operation>().unwrap(), Operation::Call);
		assert_eq!(
			"DelegateCall".parse::<Operation>().unwrap(),
			Operation::DelegateCall
		);
		assert_eq!(Operation::try_from(2u8).unwrap(), Operation::Create);
		assert!(Operation::try_from(3u8).is_err());
		assert!("selfdestruct".parse::<Operation>().is_err());
	}

	#[test]
	fn test_with_nonce_accepts_integers_and_words() {
		let tx = SafeTransaction::call(Address::ZERO, U256::ZERO, Bytes::new()).with_nonce(5u64);
		assert_eq!(tx.nonce, U256::from(5u64));
		let tx = tx.with_nonce(U256::MAX);
		assert_eq!(tx.nonce, U256::MAX);
	}

	#[test]
	fn test_outcome_into_result() {
		let ok = ExecutionOutcome::succeeded(Bytes::new());
		assert!(ok.into_result().is_ok());

		let failed = ExecutionOutcome::failed("reverted");
		assert_eq!(
			failed.into_result(),
			Err(SafeError::InnerCallFailed("reverted".to_string()))
		);
	}
}
