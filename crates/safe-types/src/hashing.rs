//! Canonical digests of wallet transactions.
//!
//! Owners sign, approve and execute against the digest produced here. The
//! digest commits to the chain id, the wallet address and every field of the
//! transaction, and is tagged with the authorization flow so an approval can
//! never be replayed as a signature bundle or the other way around.

use crate::utils::eip712::{compute_domain_hash, compute_final_digest, Eip712AbiEncoder};
use crate::SafeTransaction;
use alloy_primitives::{keccak256, Address, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type string hashed into digests authorized by an owner signature bundle.
pub const SAFE_TX_TYPE: &str =
	"SafeTx(address to,uint256 value,bytes data,uint8 operation,uint256 nonce)";

/// Type string hashed into digests authorized by recorded on-chain approvals.
pub const APPROVED_SAFE_TX_TYPE: &str =
	"ApprovedSafeTx(address to,uint256 value,bytes data,uint8 operation,uint256 nonce)";

/// How a transaction digest is authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationFlow {
	/// Off-chain signatures presented in one call, ordered by signer.
	Signatures,
	/// Approvals recorded one owner at a time, executed once the quorum is met.
	Approvals,
}

impl AuthorizationFlow {
	fn type_hash(&self) -> B256 {
		match self {
			AuthorizationFlow::Signatures => keccak256(SAFE_TX_TYPE.as_bytes()),
			AuthorizationFlow::Approvals => keccak256(APPROVED_SAFE_TX_TYPE.as_bytes()),
		}
	}
}

impl fmt::Display for AuthorizationFlow {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AuthorizationFlow::Signatures => write!(f, "signatures"),
			AuthorizationFlow::Approvals => write!(f, "approvals"),
		}
	}
}

/// Computes digests for one wallet on one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionHasher {
	chain_id: u64,
	wallet: Address,
	domain_separator: B256,
}

impl TransactionHasher {
	pub fn new(chain_id: u64, wallet: Address) -> Self {
		Self {
			chain_id,
			wallet,
			domain_separator: compute_domain_hash(chain_id, &wallet),
		}
	}

	pub fn chain_id(&self) -> u64 {
		self.chain_id
	}

	pub fn wallet(&self) -> Address {
		self.wallet
	}

	pub fn domain_separator(&self) -> B256 {
		self.domain_separator
	}

	/// Hash of the transaction fields under the flow's type string.
	pub fn struct_hash(&self, flow: AuthorizationFlow, tx: &SafeTransaction) -> B256 {
		let mut enc = Eip712AbiEncoder::new();
		enc.push_b256(&flow.type_hash());
		enc.push_address(&tx.to);
		enc.push_u256(tx.value);
		enc.push_bytes(&tx.data);
		enc.push_u8(tx.operation.as_u8());
		enc.push_u256(tx.nonce);
		keccak256(enc.finish())
	}

	/// Final digest owners sign or approve.
	pub fn digest(&self, flow: AuthorizationFlow, tx: &SafeTransaction) -> B256 {
		compute_final_digest(&self.domain_separator, &self.struct_hash(flow, tx))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Operation;
	use alloy_primitives::{address, Bytes, U256};

	fn wallet() -> Address {
		address!("0x1111111111111111111111111111111111111111")
	}

	fn sample_tx() -> SafeTransaction {
		SafeTransaction::call(
			address!("0x2222222222222222222222222222222222222222"),
			U256::from(1_000u64),
			Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
		)
		.with_nonce(7u64)
	}

	#[test]
	fn test_type_hash_matches_type_string() {
		assert_eq!(
			AuthorizationFlow::Signatures.type_hash(),
			keccak256("SafeTx(address to,uint256 value,bytes data,uint8 operation,uint256 nonce)")
		);
	}

	#[test]
	fn test_digest_is_deterministic() {
		let hasher = TransactionHasher::new(1, wallet());
		let tx = sample_tx();
		assert_eq!(
			hasher.digest(AuthorizationFlow::Signatures, &tx),
			hasher.digest(AuthorizationFlow::Signatures, &tx.clone())
		);
	}

	#[test]
	fn test_digest_commits_to_every_field() {
		let hasher = TransactionHasher::new(1, wallet());
		let tx = sample_tx();
		let base = hasher.digest(AuthorizationFlow::Signatures, &tx);

		let variants = [
			SafeTransaction {
				to: address!("0x3333333333333333333333333333333333333333"),
				..tx.clone()
			},
			SafeTransaction {
				value: U256::from(1_001u64),
				..tx.clone()
			},
			SafeTransaction {
				data: Bytes::from(vec![0xde, 0xad]),
				..tx.clone()
			},
			tx.clone().with_operation(Operation::DelegateCall),
			tx.clone().with_nonce(8u64),
		];
		for variant in variants {
			assert_ne!(base, hasher.digest(AuthorizationFlow::Signatures, &variant));
		}
	}

	#[test]
	fn test_digest_binds_wallet_chain_and_flow() {
		let tx = sample_tx();
		let base = TransactionHasher::new(1, wallet()).digest(AuthorizationFlow::Signatures, &tx);
		assert_ne!(
			base,
			TransactionHasher::new(5, wallet()).digest(AuthorizationFlow::Signatures, &tx)
		);
		assert_ne!(
			base,
			TransactionHasher::new(1, address!("0x4444444444444444444444444444444444444444"))
				.digest(AuthorizationFlow::Signatures, &tx)
		);
		assert_ne!(
			base,
			TransactionHasher::new(1, wallet()).digest(AuthorizationFlow::Approvals, &tx)
		);
	}
}
