//! Stateless signature handling.
//!
//! Signatures travel as 65 bytes `r || s || v`. `v` may be given either as a
//! parity bit (0/1) or in the legacy 27/28 form; both recover the same signer.

use crate::AccountError;
use alloy_primitives::{Address, Bytes, Signature, B256};

/// Recovers the address that produced `signature` over `digest`.
pub fn recover_signer(digest: &B256, signature: &Signature) -> Result<Address, AccountError> {
	signature
		.recover_address_from_prehash(digest)
		.map_err(|e| AccountError::InvalidSignature(e.to_string()))
}

/// Parses a packed 65-byte signature.
pub fn parse_signature(bytes: &[u8]) -> Result<Signature, AccountError> {
	if bytes.len() != 65 {
		return Err(AccountError::InvalidSignature(format!(
			"expected 65 bytes, got {}",
			bytes.len()
		)));
	}
	Signature::from_raw(bytes).map_err(|e| AccountError::InvalidSignature(e.to_string()))
}

/// Packs a signature as `r || s || v` with `v` in 27/28 form.
pub fn encode_signature(signature: &Signature) -> Bytes {
	Bytes::from(signature.as_bytes().to_vec())
}

/// Orders `(signer, signature)` pairs by ascending signer address, as the
/// wallet requires for signature bundles, and drops the addresses.
pub fn order_by_signer(mut signed: Vec<(Address, Signature)>) -> Vec<Signature> {
	signed.sort_by_key(|(signer, _)| *signer);
	signed.into_iter().map(|(_, signature)| signature).collect()
}
