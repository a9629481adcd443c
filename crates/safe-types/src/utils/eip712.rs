//! EIP-712 building blocks used by the wallet's transaction hasher.
//!
//! These helpers provide:
//! - Domain separator computation bound to chain id and wallet address
//! - Final digest computation (0x1901 || domainSeparator || structHash)
//! - A minimal ABI encoder for the static field types of wallet structs

use alloy_primitives::{keccak256, Address, B256, U256};

/// Domain type of the wallet; the wallet is identified by chain and address only.
pub const DOMAIN_TYPE: &str = "EIP712Domain(uint256 chainId,address verifyingContract)";

/// Compute the domain separator
/// (keccak256(abi.encode(typeHash, chainId, verifyingContract))).
pub fn compute_domain_hash(chain_id: u64, verifying_contract: &Address) -> B256 {
	let mut enc = Eip712AbiEncoder::new();
	enc.push_b256(&keccak256(DOMAIN_TYPE.as_bytes()));
	enc.push_u256(U256::from(chain_id));
	enc.push_address(verifying_contract);
	keccak256(enc.finish())
}

/// Compute the final EIP-712 digest: keccak256(0x1901 || domainHash || structHash).
pub fn compute_final_digest(domain_hash: &B256, struct_hash: &B256) -> B256 {
	let mut out = Vec::with_capacity(2 + 32 + 32);
	out.push(0x19);
	out.push(0x01);
	out.extend_from_slice(domain_hash.as_slice());
	out.extend_from_slice(struct_hash.as_slice());
	keccak256(out)
}

/// Minimal ABI encoder for static types used in EIP-712 struct hashing.
///
/// Dynamic `bytes` fields are encoded as the keccak256 of their contents.
#[derive(Debug, Default)]
pub struct Eip712AbiEncoder {
	buf: Vec<u8>,
}

impl Eip712AbiEncoder {
	pub fn new() -> Self {
		Self { buf: Vec::new() }
	}

	pub fn push_b256(&mut self, v: &B256) {
		self.buf.extend_from_slice(v.as_slice());
	}

	pub fn push_address(&mut self, addr: &Address) {
		let mut word = [0u8; 32];
		word[12..].copy_from_slice(addr.as_slice());
		self.buf.extend_from_slice(&word);
	}

	pub fn push_u256(&mut self, v: U256) {
		let word: [u8; 32] = v.to_be_bytes::<32>();
		self.buf.extend_from_slice(&word);
	}

	pub fn push_u8(&mut self, v: u8) {
		let mut word = [0u8; 32];
		word[31] = v;
		self.buf.extend_from_slice(&word);
	}

	pub fn push_bytes(&mut self, data: &[u8]) {
		self.push_b256(&keccak256(data));
	}

	pub fn finish(self) -> Vec<u8> {
		self.buf
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	#[test]
	fn test_encoder_word_layout() {
		let mut enc = Eip712AbiEncoder::new();
		enc.push_u8(2);
		enc.push_address(&address!("0x00000000000000000000000000000000000000aa"));
		let out = enc.finish();
		assert_eq!(out.len(), 64);
		assert_eq!(out[31], 2);
		assert!(out[..31].iter().all(|b| *b == 0));
		assert_eq!(out[63], 0xaa);
	}

	#[test]
	fn test_domain_hash_binds_chain_and_contract() {
		let wallet = address!("0x1111111111111111111111111111111111111111");
		let other = address!("0x2222222222222222222222222222222222222222");
		let base = compute_domain_hash(1, &wallet);
		assert_ne!(base, compute_domain_hash(2, &wallet));
		assert_ne!(base, compute_domain_hash(1, &other));
	}
}
