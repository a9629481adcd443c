mod common;

use alloy_sol_types::SolCall;
use common::*;
use safe_account::implementations::local::LocalWallet;
use safe_core::engine::management::disableModuleCall;
use safe_core::{Environment, Safe};
use safe_modules::implementations::daily_limit::{DailyLimitModule, DelegatedTransfer, IDailyLimit};
use safe_types::{
	Address, ExecutionOutcome, SafeError, SafeEvent, SafeTransaction, NATIVE_ASSET, U256,
};

/// Signs `transfer` for the module's next nonce and submits it.
fn withdraw(
	safe: &mut Safe,
	operator: &LocalWallet,
	transfer: &DelegatedTransfer,
) -> Result<ExecutionOutcome, SafeError> {
	let module = safe.module::<DailyLimitModule>(MODULE)?;
	let digest = module.get_transaction_hash(transfer, module.next_nonce());
	let signature = operator.sign_digest(&digest).unwrap();
	resubmit(safe, transfer, &signature)
}

fn resubmit(
	safe: &mut Safe,
	transfer: &DelegatedTransfer,
	signature: &safe_types::Signature,
) -> Result<ExecutionOutcome, SafeError> {
	safe.with_module::<DailyLimitModule, _, _>(MODULE, |module, ctx| {
		module.execute_with_signature(ctx, transfer, signature)
	})?
}

fn spent(safe: &Safe, asset: Address) -> U256 {
	safe.module::<DailyLimitModule>(MODULE)
		.unwrap()
		.daily_limit(&asset)
		.map(|e| e.spent_today)
		.unwrap_or_default()
}

#[test]
fn test_native_withdrawals_respect_daily_cap() {
	let owners = sorted_keys(1);
	let operator = LocalWallet::random();
	let mut safe = new_safe(addresses(&owners), 1);
	safe.env_mut().deposit(WALLET, eth(1_000));
	install_daily_limit(&mut safe, operator.address_sync(), vec![(NATIVE_ASSET, eth(100))]);

	let transfer = DelegatedTransfer::native(RECIPIENT, eth(50));
	let module = safe.module::<DailyLimitModule>(MODULE).unwrap();
	let digest = module.get_transaction_hash(&transfer, module.next_nonce());
	let first_signature = operator.sign_digest(&digest).unwrap();

	let outcome = resubmit(&mut safe, &transfer, &first_signature).unwrap();
	assert!(outcome.success);
	assert_eq!(spent(&safe, NATIVE_ASSET), eth(50));
	assert_eq!(safe.env().balance(RECIPIENT), eth(50));

	assert!(matches!(
		resubmit(&mut safe, &transfer, &first_signature),
		Err(SafeError::InvalidSignature(_))
	));

	assert!(withdraw(&mut safe, &operator, &transfer).unwrap().success);
	assert_eq!(spent(&safe, NATIVE_ASSET), eth(100));

	assert_eq!(
		withdraw(&mut safe, &operator, &transfer),
		Err(SafeError::DailyLimitExceeded)
	);
	assert_eq!(safe.env().balance(WALLET), eth(900));
	assert_eq!(safe.env().balance(RECIPIENT), eth(100));
	assert_eq!(
		safe.module::<DailyLimitModule>(MODULE).unwrap().next_nonce(),
		U256::from(3u64)
	);
}

#[test]
fn test_cap_resets_at_day_boundary() {
	let owners = sorted_keys(1);
	let operator = LocalWallet::random();
	let mut safe = new_safe(addresses(&owners), 1);
	safe.env_mut().deposit(WALLET, eth(1_000));
	install_daily_limit(&mut safe, operator.address_sync(), vec![(NATIVE_ASSET, eth(100))]);

	let full = DelegatedTransfer::native(RECIPIENT, eth(100));
	assert!(withdraw(&mut safe, &operator, &full).unwrap().success);
	let one = DelegatedTransfer::native(RECIPIENT, eth(1));
	assert_eq!(
		withdraw(&mut safe, &operator, &one),
		Err(SafeError::DailyLimitExceeded)
	);

	safe.env_mut().advance_time(86_400);
	assert!(withdraw(&mut safe, &operator, &full).unwrap().success);
	assert_eq!(spent(&safe, NATIVE_ASSET), eth(100));
	assert_eq!(safe.env().balance(RECIPIENT), eth(200));
}

#[test]
fn test_limit_change_needs_quorum() {
	let keys = sorted_keys(3);
	let owners = addresses(&keys);
	let operator = LocalWallet::random();
	let mut safe = new_safe(owners.clone(), 2);
	install_daily_limit(&mut safe, operator.address_sync(), vec![(NATIVE_ASSET, eth(100))]);
	let mut events = safe.subscribe();

	let data = IDailyLimit::changeDailyLimitCall {
		asset: NATIVE_ASSET,
		limit: eth(200),
	}
	.abi_encode();
	let tx = SafeTransaction::call(MODULE, U256::ZERO, data).with_nonce(1_700_000_000u64);

	safe.approve_transaction(owners[0], &tx).unwrap();
	assert_eq!(
		safe.exec_transaction_if_approved(RECIPIENT, &tx),
		Err(SafeError::InsufficientApprovals { have: 1, need: 2 })
	);

	safe.approve_transaction(owners[1], &tx).unwrap();
	let outcome = safe.exec_transaction_if_approved(RECIPIENT, &tx).unwrap();
	assert!(outcome.success);

	let module = safe.module::<DailyLimitModule>(MODULE).unwrap();
	assert_eq!(module.daily_limit(&NATIVE_ASSET).unwrap().limit, eth(200));

	let received: Vec<SafeEvent> = std::iter::from_fn(|| events.try_recv().ok()).collect();
	assert!(received.contains(&SafeEvent::DailyLimitChanged {
		module: MODULE,
		asset: NATIVE_ASSET,
		limit: eth(200),
	}));
}

#[test]
fn test_token_withdrawals_share_accounting() {
	let owners = sorted_keys(1);
	let operator = LocalWallet::random();
	let mut safe = new_safe(addresses(&owners), 1);
	safe.env_mut()
		.deploy_contract(TOKEN, Box::new(MockToken::with_balance(WALLET, eth(100))));
	install_daily_limit(&mut safe, operator.address_sync(), vec![(TOKEN, eth(20))]);

	let transfer = DelegatedTransfer::token(TOKEN, RECIPIENT, eth(10));
	assert!(withdraw(&mut safe, &operator, &transfer).unwrap().success);
	assert!(withdraw(&mut safe, &operator, &transfer).unwrap().success);
	assert_eq!(
		withdraw(&mut safe, &operator, &transfer),
		Err(SafeError::DailyLimitExceeded)
	);

	assert_eq!(token_balance(&safe, RECIPIENT), eth(20));
	assert_eq!(token_balance(&safe, WALLET), eth(80));
	assert_eq!(spent(&safe, TOKEN), eth(20));

	safe.env_mut().advance_time(86_400);
	assert!(withdraw(&mut safe, &operator, &transfer).unwrap().success);
	assert_eq!(token_balance(&safe, RECIPIENT), eth(30));
}

#[test]
fn test_failed_transfer_consumes_nonce_without_charge() {
	let owners = sorted_keys(1);
	let operator = LocalWallet::random();
	let mut safe = new_safe(addresses(&owners), 1);
	install_daily_limit(&mut safe, operator.address_sync(), vec![(NATIVE_ASSET, eth(100))]);

	let transfer = DelegatedTransfer::native(RECIPIENT, eth(10));
	let outcome = withdraw(&mut safe, &operator, &transfer).unwrap();
	assert!(!outcome.success);
	assert_eq!(spent(&safe, NATIVE_ASSET), U256::ZERO);
	assert_eq!(
		safe.module::<DailyLimitModule>(MODULE).unwrap().next_nonce(),
		U256::from(2u64)
	);
}

#[test]
fn test_disabled_module_cannot_withdraw() {
	let owners = sorted_keys(1);
	let operator = LocalWallet::random();
	let mut safe = new_safe(addresses(&owners), 1);
	safe.env_mut().deposit(WALLET, eth(100));
	install_daily_limit(&mut safe, operator.address_sync(), vec![(NATIVE_ASSET, eth(100))]);
	assert_eq!(safe.modules(), &[MODULE]);

	let disable = SafeTransaction::call(
		WALLET,
		U256::ZERO,
		disableModuleCall { module: MODULE }.abi_encode(),
	);
	assert!(exec_signed(&mut safe, disable, &[&owners[0]]).success);
	assert!(!safe.is_module_enabled(&MODULE));

	let transfer = DelegatedTransfer::native(RECIPIENT, eth(10));
	assert_eq!(
		withdraw(&mut safe, &operator, &transfer),
		Err(SafeError::NotAModule(MODULE))
	);
	assert_eq!(safe.env().balance(WALLET), eth(100));
	assert_eq!(
		safe.module::<DailyLimitModule>(MODULE).unwrap().next_nonce(),
		U256::from(1u64)
	);
}

#[test]
fn test_unknown_module_lookup() {
	let owners = sorted_keys(1);
	let mut safe = new_safe(addresses(&owners), 1);
	assert!(matches!(
		safe.module::<DailyLimitModule>(MODULE),
		Err(SafeError::ModuleNotFound(_))
	));
	let transfer = DelegatedTransfer::native(RECIPIENT, eth(1));
	let signature = LocalWallet::random()
		.sign_digest(&safe_types::B256::ZERO)
		.unwrap();
	assert_eq!(
		resubmit(&mut safe, &transfer, &signature),
		Err(SafeError::ModuleNotFound(MODULE))
	);
}
