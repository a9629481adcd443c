#![allow(dead_code)]

use alloy_primitives::address;
use alloy_sol_types::{sol, SolCall};
use safe_account::implementations::local::LocalWallet;
use safe_core::{Contract, InMemoryEnvironment, Safe, SafeSetup, WalletSettings};
use safe_modules::implementations::daily_limit::DailyLimitModule;
use safe_types::{Address, Bytes, SafeTransaction, Signature, U256};
use std::collections::BTreeMap;

pub const WALLET: Address = address!("0x00000000000000000000000000000000000000aa");
pub const MODULE: Address = address!("0x00000000000000000000000000000000000000bb");
pub const TOKEN: Address = address!("0x00000000000000000000000000000000000000cc");
pub const RECIPIENT: Address = address!("0x00000000000000000000000000000000000000dd");

/// Midday of an arbitrary day, so small clock moves stay within it.
pub const START_TIME: u64 = 19_700 * 86_400 + 43_200;

sol! {
	interface IMockToken {
		function transfer(address to, uint256 value) external returns (bool);
		function balanceOf(address owner) external view returns (uint256);
	}
}

/// Minimal ERC-20 fixture.
#[derive(Default)]
pub struct MockToken {
	balances: BTreeMap<Address, U256>,
}

impl MockToken {
	pub fn with_balance(holder: Address, amount: U256) -> Self {
		let mut token = Self::default();
		token.balances.insert(holder, amount);
		token
	}
}

impl Contract for MockToken {
	fn call(&mut self, caller: Address, value: U256, data: &[u8]) -> Result<Bytes, String> {
		if !value.is_zero() {
			return Err("token does not accept value".to_string());
		}
		let call = IMockToken::transferCall::abi_decode(data).map_err(|e| e.to_string())?;
		let from = self.balances.get(&caller).copied().unwrap_or_default();
		let remaining = from
			.checked_sub(call.value)
			.ok_or_else(|| "transfer amount exceeds balance".to_string())?;
		self.balances.insert(caller, remaining);
		*self.balances.entry(call.to).or_default() += call.value;
		Ok(Bytes::from(U256::from(1u64).to_be_bytes::<32>().to_vec()))
	}

	fn static_call(&self, data: &[u8]) -> Result<Bytes, String> {
		let call = IMockToken::balanceOfCall::abi_decode(data).map_err(|e| e.to_string())?;
		let balance = self.balances.get(&call.owner).copied().unwrap_or_default();
		Ok(Bytes::from(balance.to_be_bytes::<32>().to_vec()))
	}
}

/// Reads a token balance through the environment.
pub fn token_balance(safe: &Safe, holder: Address) -> U256 {
	let data = IMockToken::balanceOfCall { owner: holder }.abi_encode();
	let output = safe_core::Environment::static_call(safe.env(), TOKEN, &data).unwrap();
	U256::from_be_slice(&output)
}

/// `count` fresh keys ordered by address.
pub fn sorted_keys(count: usize) -> Vec<LocalWallet> {
	let mut keys: Vec<LocalWallet> = (0..count).map(|_| LocalWallet::random()).collect();
	keys.sort_by_key(|k| k.address_sync());
	keys
}

pub fn addresses(keys: &[LocalWallet]) -> Vec<Address> {
	keys.iter().map(|k| k.address_sync()).collect()
}

/// Wallet at `WALLET` on an environment frozen at `START_TIME`.
pub fn new_safe(owners: Vec<Address>, threshold: usize) -> Safe {
	let mut env = InMemoryEnvironment::new(1);
	env.set_timestamp(START_TIME);
	Safe::new(
		SafeSetup {
			address: WALLET,
			owners,
			threshold,
			settings: WalletSettings::default(),
		},
		env,
	)
	.unwrap()
}

/// Hosts an enabled daily-limit module at `MODULE`.
pub fn install_daily_limit(safe: &mut Safe, operator: Address, limits: Vec<(Address, U256)>) {
	let module = DailyLimitModule::new(MODULE, WALLET, operator, limits);
	safe.install_module(Box::new(module), true).unwrap();
}

/// Signatures of `signers` over the wallet digest of `tx`, ordered by signer.
pub fn sign_all(safe: &Safe, tx: &SafeTransaction, signers: &[&LocalWallet]) -> Vec<Signature> {
	let digest = safe.get_transaction_hash(tx);
	let signed = signers
		.iter()
		.map(|k| (k.address_sync(), k.sign_digest(&digest).unwrap()))
		.collect();
	safe_account::order_by_signer(signed)
}

/// Runs `tx` through the signature flow at the wallet's current nonce.
pub fn exec_signed(
	safe: &mut Safe,
	tx: SafeTransaction,
	signers: &[&LocalWallet],
) -> safe_types::ExecutionOutcome {
	let tx = tx.with_nonce(safe.nonce());
	let signatures = sign_all(safe, &tx, signers);
	safe.exec_transaction(&tx, &signatures).unwrap()
}

pub fn eth(amount: u64) -> U256 {
	U256::from(amount)
}
