//! Daily spending-limit module.
//!
//! Lets a single delegated operator withdraw the wallet's assets without an
//! owner quorum, up to a per-asset cap that resets at every day boundary
//! (day index = unix time / 86400). The native asset and tokens share the
//! same accounting; an asset is identified by its contract address and the
//! native asset by the zero address.
//!
//! Each withdrawal is authorized by the operator's signature over
//! `keccak256(0x19 || 0x00 || module || to || value || data || nonce)` where
//! `nonce` is the module's used nonce plus one. Because the nonce is implied
//! rather than supplied, a replayed or out-of-order signature recovers a
//! different address and is rejected as an invalid signature.
//!
//! Limits and the operator are changed through wallet transactions addressed
//! to the module, so they need the full owner quorum.

use crate::{ModuleError, ModuleFactory, SafeModule, SafeModuleRegistry};
use alloy_primitives::{hex, keccak256};
use alloy_sol_types::{sol, SolCall};
use safe_account::recover_signer;
use safe_types::{
	day_index, parse_address, parse_u256, Address, Bytes, ConfigSchema, ExecutionOutcome, Field,
	FieldType, ImplementationRegistry, ModuleContext, Operation, SafeError, SafeEvent, Schema,
	Signature, ValidationError, B256, NATIVE_ASSET, SENTINEL_ADDRESS, U256,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;

sol! {
	/// Management entry points the wallet calls on the module.
	interface IDailyLimit {
		function changeDailyLimit(address asset, uint256 limit) external;
		function changeOperator(address operator) external;
	}

	/// Token entry points used by delegated withdrawals.
	interface IERC20 {
		function transfer(address to, uint256 value) external returns (bool);
		function balanceOf(address owner) external view returns (uint256);
	}
}

/// Cap and usage of one asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyLimitEntry {
	/// Maximum spend per day window; zero disables withdrawals.
	pub limit: U256,
	/// Amount withdrawn during `last_day_index`.
	pub spent_today: U256,
	/// Day window `spent_today` belongs to.
	pub last_day_index: u64,
}

impl DailyLimitEntry {
	/// Amount already spent in `day`; usage from earlier windows does not count.
	pub fn spent_on(&self, day: u64) -> U256 {
		if day == self.last_day_index {
			self.spent_today
		} else {
			U256::ZERO
		}
	}

	/// Amount still available in `day`.
	pub fn remaining(&self, day: u64) -> U256 {
		self.limit.saturating_sub(self.spent_on(day))
	}
}

/// Delegated signer and the last nonce it consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationState {
	pub operator: Address,
	pub used_nonce: U256,
}

/// Private state of the module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyLimitState {
	pub delegation: DelegationState,
	pub limits: BTreeMap<Address, DailyLimitEntry>,
}

/// Transfer an operator asks the module to perform.
///
/// Empty `data` moves `value` of the native asset to `to`. Otherwise `to` is
/// a token contract, `data` must be an encoded `transfer(address,uint256)`
/// and `value` must be zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatedTransfer {
	pub to: Address,
	pub value: U256,
	pub data: Bytes,
}

/// Asset movement a transfer amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdrawal {
	pub asset: Address,
	pub amount: U256,
	pub recipient: Address,
}

impl DelegatedTransfer {
	pub fn native(to: Address, value: U256) -> Self {
		Self {
			to,
			value,
			data: Bytes::new(),
		}
	}

	pub fn token(token: Address, recipient: Address, amount: U256) -> Self {
		let data = IERC20::transferCall {
			to: recipient,
			value: amount,
		}
		.abi_encode();
		Self {
			to: token,
			value: U256::ZERO,
			data: data.into(),
		}
	}

	/// Classifies the transfer into asset, amount and recipient.
	pub fn withdrawal(&self) -> Result<Withdrawal, SafeError> {
		let withdrawal = if self.data.is_empty() {
			Withdrawal {
				asset: NATIVE_ASSET,
				amount: self.value,
				recipient: self.to,
			}
		} else {
			if self.to == NATIVE_ASSET {
				return Err(SafeError::InvalidTransfer(
					"token transfer has no token address".to_string(),
				));
			}
			if !self.value.is_zero() {
				return Err(SafeError::InvalidTransfer(
					"token transfers cannot carry native value".to_string(),
				));
			}
			let call = IERC20::transferCall::abi_decode(&self.data).map_err(|e| {
				SafeError::InvalidTransfer(format!("data is not a token transfer: {}", e))
			})?;
			Withdrawal {
				asset: self.to,
				amount: call.value,
				recipient: call.to,
			}
		};
		if withdrawal.amount.is_zero() {
			return Err(SafeError::InvalidTransfer("amount is zero".to_string()));
		}
		Ok(withdrawal)
	}
}

/// Spending-limit module hosted by one wallet.
#[derive(Debug, Clone)]
pub struct DailyLimitModule {
	address: Address,
	wallet: Address,
	state: DailyLimitState,
}

impl DailyLimitModule {
	pub fn new(
		address: Address,
		wallet: Address,
		operator: Address,
		limits: impl IntoIterator<Item = (Address, U256)>,
	) -> Self {
		let limits = limits
			.into_iter()
			.map(|(asset, limit)| {
				(
					asset,
					DailyLimitEntry {
						limit,
						..Default::default()
					},
				)
			})
			.collect();
		Self {
			address,
			wallet,
			state: DailyLimitState {
				delegation: DelegationState {
					operator,
					used_nonce: U256::ZERO,
				},
				limits,
			},
		}
	}

	pub fn wallet(&self) -> Address {
		self.wallet
	}

	pub fn operator(&self) -> Address {
		self.state.delegation.operator
	}

	pub fn delegation(&self) -> &DelegationState {
		&self.state.delegation
	}

	/// Nonce the next withdrawal signature must commit to.
	pub fn next_nonce(&self) -> U256 {
		self.state.delegation.used_nonce + U256::from(1u64)
	}

	pub fn daily_limit(&self, asset: &Address) -> Option<&DailyLimitEntry> {
		self.state.limits.get(asset)
	}

	pub fn daily_limits(&self) -> impl Iterator<Item = (&Address, &DailyLimitEntry)> {
		self.state.limits.iter()
	}

	/// Digest the operator signs for `transfer` at `nonce`.
	pub fn get_transaction_hash(&self, transfer: &DelegatedTransfer, nonce: U256) -> B256 {
		let mut packed = Vec::with_capacity(2 + 20 + 20 + 32 + transfer.data.len() + 32);
		packed.extend_from_slice(&[0x19, 0x00]);
		packed.extend_from_slice(self.address.as_slice());
		packed.extend_from_slice(transfer.to.as_slice());
		packed.extend_from_slice(&transfer.value.to_be_bytes::<32>());
		packed.extend_from_slice(&transfer.data);
		packed.extend_from_slice(&nonce.to_be_bytes::<32>());
		keccak256(packed)
	}

	/// Sets the cap of `asset`; spend already recorded today is kept.
	pub fn change_daily_limit(&mut self, asset: Address, limit: U256) {
		self.state.limits.entry(asset).or_default().limit = limit;
	}

	pub fn change_operator(&mut self, operator: Address) {
		self.state.delegation.operator = operator;
	}

	/// Performs an operator-signed withdrawal.
	///
	/// Checks run in order: transfer shape, operator signature over the next
	/// nonce, then the asset's cap in the current day window. A rejection at
	/// any of these leaves the module unchanged. Once accepted the nonce is
	/// consumed; the spend is charged only if the transfer itself succeeded.
	pub fn execute_with_signature(
		&mut self,
		ctx: &mut dyn ModuleContext,
		transfer: &DelegatedTransfer,
		signature: &Signature,
	) -> Result<ExecutionOutcome, SafeError> {
		if ctx.wallet() != self.wallet || ctx.module() != self.address {
			return Err(SafeError::NotAModule(self.address));
		}

		let withdrawal = transfer.withdrawal()?;

		let previous_nonce = self.state.delegation.used_nonce;
		let nonce = self.next_nonce();
		let digest = self.get_transaction_hash(transfer, nonce);
		let signer = recover_signer(&digest, signature)
			.map_err(|e| SafeError::InvalidSignature(e.to_string()))?;
		if signer != self.state.delegation.operator {
			return Err(SafeError::InvalidSignature(format!(
				"{} is not the delegated operator",
				signer
			)));
		}

		let today = day_index(ctx.timestamp());
		let entry = self
			.state
			.limits
			.get(&withdrawal.asset)
			.cloned()
			.unwrap_or_default();
		let spent = entry
			.spent_on(today)
			.checked_add(withdrawal.amount)
			.filter(|total| *total <= entry.limit)
			.ok_or(SafeError::DailyLimitExceeded)?;

		self.state.delegation.used_nonce = nonce;

		let (to, value, data) = if withdrawal.asset == NATIVE_ASSET {
			(withdrawal.recipient, withdrawal.amount, Bytes::new())
		} else {
			(transfer.to, U256::ZERO, transfer.data.clone())
		};

		let outcome = match ctx.execute_from_module(to, value, data, Operation::Call) {
			Ok(outcome) => outcome,
			Err(e) => {
				self.state.delegation.used_nonce = previous_nonce;
				return Err(e);
			},
		};

		if outcome.success {
			self.state.limits.insert(
				withdrawal.asset,
				DailyLimitEntry {
					limit: entry.limit,
					spent_today: spent,
					last_day_index: today,
				},
			);
			tracing::info!(
				module = %self.address,
				asset = %withdrawal.asset,
				amount = %withdrawal.amount,
				to = %withdrawal.recipient,
				spent_today = %spent,
				"Delegated withdrawal executed"
			);
			ctx.emit(SafeEvent::DelegatedWithdrawal {
				module: self.address,
				asset: withdrawal.asset,
				amount: withdrawal.amount,
				to: withdrawal.recipient,
			});
		} else {
			tracing::warn!(
				module = %self.address,
				asset = %withdrawal.asset,
				error = outcome.error.as_deref().unwrap_or("unknown"),
				"Delegated withdrawal failed, nonce consumed without charge"
			);
		}

		Ok(outcome)
	}
}

impl SafeModule for DailyLimitModule {
	fn name(&self) -> &'static str {
		Registry::NAME
	}

	fn address(&self) -> Address {
		self.address
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(DailyLimitSchema)
	}

	fn on_wallet_call(
		&mut self,
		ctx: &mut dyn ModuleContext,
		value: U256,
		data: &[u8],
	) -> Result<Bytes, ModuleError> {
		if !value.is_zero() {
			return Err(ModuleError::InvalidCallData(
				"module does not accept native value".to_string(),
			));
		}
		let selector = data
			.get(..4)
			.ok_or_else(|| ModuleError::InvalidCallData("missing function selector".to_string()))?;

		if selector == IDailyLimit::changeDailyLimitCall::SELECTOR {
			let call = IDailyLimit::changeDailyLimitCall::abi_decode(data)
				.map_err(|e| ModuleError::InvalidCallData(e.to_string()))?;
			self.change_daily_limit(call.asset, call.limit);
			tracing::info!(
				module = %self.address,
				asset = %call.asset,
				limit = %call.limit,
				"Daily limit changed"
			);
			ctx.emit(SafeEvent::DailyLimitChanged {
				module: self.address,
				asset: call.asset,
				limit: call.limit,
			});
		} else if selector == IDailyLimit::changeOperatorCall::SELECTOR {
			let call = IDailyLimit::changeOperatorCall::abi_decode(data)
				.map_err(|e| ModuleError::InvalidCallData(e.to_string()))?;
			self.change_operator(call.operator);
			tracing::info!(module = %self.address, operator = %call.operator, "Operator changed");
			ctx.emit(SafeEvent::OperatorChanged {
				module: self.address,
				operator: call.operator,
			});
		} else {
			return Err(ModuleError::UnknownFunction(hex::encode_prefixed(selector)));
		}

		Ok(Bytes::new())
	}

	fn snapshot(&self) -> Result<serde_json::Value, ModuleError> {
		serde_json::to_value(&self.state).map_err(|e| ModuleError::State(e.to_string()))
	}

	fn restore(&mut self, state: serde_json::Value) -> Result<(), ModuleError> {
		self.state = serde_json::from_value(state).map_err(|e| ModuleError::State(e.to_string()))?;
		Ok(())
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}
}

/// Configuration schema for the daily limit module.
///
/// ```toml
/// [modules.daily_limit]
/// address = "0x..."
/// operator = "0x..."
/// enabled = true
/// [[modules.daily_limit.limits]]
/// asset = "0x0000000000000000000000000000000000000000"
/// limit = "100"
/// ```
pub struct DailyLimitSchema;

impl ConfigSchema for DailyLimitSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let reserved = |value: &toml::Value| {
			let address = value
				.as_str()
				.and_then(|s| parse_address(s).ok())
				.unwrap_or_default();
			if address == Address::ZERO || address == SENTINEL_ADDRESS {
				Err("reserved address".to_string())
			} else {
				Ok(())
			}
		};
		let schema = Schema::new(
			vec![
				Field::new("address", FieldType::Address).with_validator(reserved),
				Field::new("operator", FieldType::Address),
			],
			vec![
				Field::new("enabled", FieldType::Boolean),
				Field::new(
					"limits",
					FieldType::Array(Box::new(FieldType::Table(Schema::new(
						vec![
							Field::new("asset", FieldType::Address),
							Field::new("limit", FieldType::Amount),
						],
						vec![],
					)))),
				),
			],
		);
		schema.validate(config)
	}
}

fn address_field(config: &toml::Value, name: &str) -> Result<Address, ModuleError> {
	config
		.get(name)
		.and_then(|v| v.as_str())
		.ok_or_else(|| ModuleError::InvalidConfig(format!("{} is required", name)))
		.and_then(|s| parse_address(s).map_err(ModuleError::InvalidConfig))
}

/// Factory function to create the module from its configuration section.
pub fn create_module(
	config: &toml::Value,
	wallet: Address,
) -> Result<Box<dyn SafeModule>, ModuleError> {
	DailyLimitSchema
		.validate(config)
		.map_err(|e| ModuleError::InvalidConfig(e.to_string()))?;

	let address = address_field(config, "address")?;
	if address == wallet {
		return Err(ModuleError::InvalidConfig(
			"module address cannot be the wallet address".to_string(),
		));
	}
	let operator = address_field(config, "operator")?;

	let mut limits = Vec::new();
	if let Some(entries) = config.get("limits").and_then(|v| v.as_array()) {
		for entry in entries {
			let asset = address_field(entry, "asset")?;
			let limit = entry
				.get("limit")
				.and_then(|v| v.as_str())
				.ok_or_else(|| ModuleError::InvalidConfig("limit is required".to_string()))
				.and_then(|s| parse_u256(s).map_err(ModuleError::InvalidConfig))?;
			limits.push((asset, limit));
		}
	}

	Ok(Box::new(DailyLimitModule::new(
		address, wallet, operator, limits,
	)))
}

/// Registry for the daily limit module implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "daily_limit";
	type Factory = ModuleFactory;

	fn factory() -> Self::Factory {
		create_module
	}
}

impl SafeModuleRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use safe_account::implementations::local::LocalWallet;
	use alloy_primitives::address;
	use safe_types::utils::SECONDS_PER_DAY;

	const MODULE: Address = address!("0x3333333333333333333333333333333333333333");
	const WALLET: Address = address!("0x4444444444444444444444444444444444444444");
	const RECIPIENT: Address = address!("0x5555555555555555555555555555555555555555");
	const TOKEN: Address = address!("0x6666666666666666666666666666666666666666");

	struct MockContext {
		timestamp: u64,
		enabled: bool,
		fail_inner: bool,
		calls: Vec<(Address, U256, Bytes)>,
		events: Vec<SafeEvent>,
	}

	impl MockContext {
		fn new() -> Self {
			Self {
				timestamp: 1_700_000_000,
				enabled: true,
				fail_inner: false,
				calls: Vec::new(),
				events: Vec::new(),
			}
		}
	}

	impl ModuleContext for MockContext {
		fn wallet(&self) -> Address {
			WALLET
		}

		fn module(&self) -> Address {
			MODULE
		}

		fn chain_id(&self) -> u64 {
			1
		}

		fn timestamp(&self) -> u64 {
			self.timestamp
		}

		fn execute_from_module(
			&mut self,
			to: Address,
			value: U256,
			data: Bytes,
			_operation: Operation,
		) -> Result<ExecutionOutcome, SafeError> {
			if !self.enabled {
				return Err(SafeError::NotAModule(MODULE));
			}
			self.calls.push((to, value, data));
			if self.fail_inner {
				Ok(ExecutionOutcome::failed("insufficient balance"))
			} else {
				Ok(ExecutionOutcome::succeeded(Bytes::new()))
			}
		}

		fn emit(&mut self, event: SafeEvent) {
			self.events.push(event);
		}
	}

	fn setup() -> (DailyLimitModule, LocalWallet) {
		let operator = LocalWallet::random();
		let module = DailyLimitModule::new(
			MODULE,
			WALLET,
			operator.address_sync(),
			[(NATIVE_ASSET, U256::from(100u64)), (TOKEN, U256::from(20u64))],
		);
		(module, operator)
	}

	fn sign(
		module: &DailyLimitModule,
		operator: &LocalWallet,
		transfer: &DelegatedTransfer,
	) -> Signature {
		let digest = module.get_transaction_hash(transfer, module.next_nonce());
		operator.sign_digest(&digest).unwrap()
	}

	#[test]
	fn test_withdraw_replay_and_cap() {
		let (mut module, operator) = setup();
		let mut ctx = MockContext::new();
		let transfer = DelegatedTransfer::native(RECIPIENT, U256::from(50u64));

		let sig = sign(&module, &operator, &transfer);
		let outcome = module.execute_with_signature(&mut ctx, &transfer, &sig).unwrap();
		assert!(outcome.success);
		assert_eq!(ctx.calls, vec![(RECIPIENT, U256::from(50u64), Bytes::new())]);
		assert_eq!(module.next_nonce(), U256::from(2u64));

		assert!(matches!(
			module.execute_with_signature(&mut ctx, &transfer, &sig),
			Err(SafeError::InvalidSignature(_))
		));

		let sig = sign(&module, &operator, &transfer);
		module.execute_with_signature(&mut ctx, &transfer, &sig).unwrap();
		let today = day_index(ctx.timestamp);
		assert_eq!(
			module.daily_limit(&NATIVE_ASSET).unwrap().spent_on(today),
			U256::from(100u64)
		);

		let sig = sign(&module, &operator, &transfer);
		let before = module.delegation().clone();
		assert_eq!(
			module.execute_with_signature(&mut ctx, &transfer, &sig),
			Err(SafeError::DailyLimitExceeded)
		);
		assert_eq!(module.delegation(), &before);
		assert_eq!(ctx.calls.len(), 2);
		assert_eq!(
			ctx.events
				.iter()
				.filter(|e| matches!(e, SafeEvent::DelegatedWithdrawal { .. }))
				.count(),
			2
		);
	}

	#[test]
	fn test_day_rollover_resets_spend() {
		let (mut module, operator) = setup();
		let mut ctx = MockContext::new();
		let transfer = DelegatedTransfer::native(RECIPIENT, U256::from(100u64));

		let sig = sign(&module, &operator, &transfer);
		module.execute_with_signature(&mut ctx, &transfer, &sig).unwrap();

		let sig = sign(&module, &operator, &transfer);
		assert_eq!(
			module.execute_with_signature(&mut ctx, &transfer, &sig),
			Err(SafeError::DailyLimitExceeded)
		);

		ctx.timestamp += SECONDS_PER_DAY;
		assert!(module
			.execute_with_signature(&mut ctx, &transfer, &sig)
			.unwrap()
			.success);
	}

	#[test]
	fn test_signature_from_other_key_rejected() {
		let (mut module, _) = setup();
		let mut ctx = MockContext::new();
		let transfer = DelegatedTransfer::native(RECIPIENT, U256::from(10u64));
		let sig = sign(&module, &LocalWallet::random(), &transfer);
		assert!(matches!(
			module.execute_with_signature(&mut ctx, &transfer, &sig),
			Err(SafeError::InvalidSignature(_))
		));
		assert_eq!(module.next_nonce(), U256::from(1u64));
	}

	#[test]
	fn test_token_transfer_is_charged_against_token_cap() {
		let (mut module, operator) = setup();
		let mut ctx = MockContext::new();
		let transfer = DelegatedTransfer::token(TOKEN, RECIPIENT, U256::from(10u64));

		assert_eq!(
			transfer.withdrawal().unwrap(),
			Withdrawal {
				asset: TOKEN,
				amount: U256::from(10u64),
				recipient: RECIPIENT,
			}
		);

		for _ in 0..2 {
			let sig = sign(&module, &operator, &transfer);
			module.execute_with_signature(&mut ctx, &transfer, &sig).unwrap();
		}
		assert_eq!(ctx.calls[0].0, TOKEN);
		assert_eq!(ctx.calls[0].1, U256::ZERO);
		assert_eq!(ctx.calls[0].2, transfer.data);

		let sig = sign(&module, &operator, &transfer);
		assert_eq!(
			module.execute_with_signature(&mut ctx, &transfer, &sig),
			Err(SafeError::DailyLimitExceeded)
		);
		// The native cap is untouched by token spend.
		let today = day_index(ctx.timestamp);
		assert_eq!(
			module.daily_limit(&NATIVE_ASSET).unwrap().remaining(today),
			U256::from(100u64)
		);
	}

	#[test]
	fn test_malformed_transfers() {
		let mut with_value = DelegatedTransfer::token(TOKEN, RECIPIENT, U256::from(10u64));
		with_value.value = U256::from(1u64);
		assert!(matches!(with_value.withdrawal(), Err(SafeError::InvalidTransfer(_))));

		let garbage = DelegatedTransfer {
			to: TOKEN,
			value: U256::ZERO,
			data: Bytes::from(vec![0x01, 0x02, 0x03, 0x04, 0x05]),
		};
		assert!(matches!(garbage.withdrawal(), Err(SafeError::InvalidTransfer(_))));

		let zero = DelegatedTransfer::native(RECIPIENT, U256::ZERO);
		assert!(matches!(zero.withdrawal(), Err(SafeError::InvalidTransfer(_))));
	}

	#[test]
	fn test_token_transfer_to_zero_address_rejected() {
		let (mut module, operator) = setup();
		let mut ctx = MockContext::new();
		let transfer = DelegatedTransfer::token(NATIVE_ASSET, RECIPIENT, U256::from(30u64));
		assert!(matches!(transfer.withdrawal(), Err(SafeError::InvalidTransfer(_))));

		let sig = sign(&module, &operator, &transfer);
		assert!(matches!(
			module.execute_with_signature(&mut ctx, &transfer, &sig),
			Err(SafeError::InvalidTransfer(_))
		));
		assert!(ctx.calls.is_empty());
		assert_eq!(module.next_nonce(), U256::from(1u64));
		assert_eq!(
			module.daily_limit(&NATIVE_ASSET).unwrap().spent_today,
			U256::ZERO
		);
	}

	#[test]
	fn test_disabled_module_keeps_nonce() {
		let (mut module, operator) = setup();
		let mut ctx = MockContext::new();
		ctx.enabled = false;
		let transfer = DelegatedTransfer::native(RECIPIENT, U256::from(10u64));
		let sig = sign(&module, &operator, &transfer);
		assert_eq!(
			module.execute_with_signature(&mut ctx, &transfer, &sig),
			Err(SafeError::NotAModule(MODULE))
		);
		assert_eq!(module.next_nonce(), U256::from(1u64));
	}

	#[test]
	fn test_inner_failure_consumes_nonce_without_charge() {
		let (mut module, operator) = setup();
		let mut ctx = MockContext::new();
		ctx.fail_inner = true;
		let transfer = DelegatedTransfer::native(RECIPIENT, U256::from(10u64));
		let sig = sign(&module, &operator, &transfer);
		let outcome = module.execute_with_signature(&mut ctx, &transfer, &sig).unwrap();
		assert!(!outcome.success);
		assert_eq!(module.next_nonce(), U256::from(2u64));
		assert_eq!(
			module.daily_limit(&NATIVE_ASSET).unwrap().spent_today,
			U256::ZERO
		);
	}

	#[test]
	fn test_wallet_calls_change_limit_and_operator() {
		let (mut module, operator) = setup();
		let mut ctx = MockContext::new();
		let transfer = DelegatedTransfer::native(RECIPIENT, U256::from(60u64));
		let sig = sign(&module, &operator, &transfer);
		module.execute_with_signature(&mut ctx, &transfer, &sig).unwrap();

		let data = IDailyLimit::changeDailyLimitCall {
			asset: NATIVE_ASSET,
			limit: U256::from(200u64),
		}
		.abi_encode();
		module.on_wallet_call(&mut ctx, U256::ZERO, &data).unwrap();
		let entry = module.daily_limit(&NATIVE_ASSET).unwrap();
		assert_eq!(entry.limit, U256::from(200u64));
		assert_eq!(entry.spent_today, U256::from(60u64));

		let new_operator = Address::repeat_byte(0x77);
		let data = IDailyLimit::changeOperatorCall {
			operator: new_operator,
		}
		.abi_encode();
		module.on_wallet_call(&mut ctx, U256::ZERO, &data).unwrap();
		assert_eq!(module.operator(), new_operator);

		assert!(matches!(
			module.on_wallet_call(&mut ctx, U256::ZERO, &[0xde, 0xad, 0xbe, 0xef]),
			Err(ModuleError::UnknownFunction(_))
		));
		assert!(matches!(
			module.on_wallet_call(&mut ctx, U256::from(1u64), &data),
			Err(ModuleError::InvalidCallData(_))
		));
	}

	#[test]
	fn test_factory_and_snapshot() {
		let config: toml::Value = toml::from_str(
			r#"
			address = "0x3333333333333333333333333333333333333333"
			operator = "0x7777777777777777777777777777777777777777"
			[[limits]]
			asset = "0x0000000000000000000000000000000000000000"
			limit = "100"
			"#,
		)
		.unwrap();
		let mut module = create_module(&config, WALLET).unwrap();
		assert_eq!(module.name(), "daily_limit");
		assert_eq!(module.address(), MODULE);

		let mut snapshot = module.snapshot().unwrap();
		let typed = module
			.as_any()
			.downcast_ref::<DailyLimitModule>()
			.unwrap();
		assert_eq!(
			typed.daily_limit(&NATIVE_ASSET).unwrap().limit,
			U256::from(100u64)
		);

		snapshot["delegation"]["used_nonce"] = serde_json::json!("0x5");
		module.restore(snapshot).unwrap();
		let typed = module
			.as_any_mut()
			.downcast_mut::<DailyLimitModule>()
			.unwrap();
		assert_eq!(typed.next_nonce(), U256::from(6u64));

		assert!(create_module(&config, MODULE).is_err());
	}
}
