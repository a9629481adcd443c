//! Authorization and execution engine of the wallet.
//!
//! `Safe` accepts a transaction through one of two flows, performs it exactly
//! once and publishes what happened:
//!
//! - `exec_transaction`: a bundle of owner signatures over the digest of a
//!   transaction carrying the wallet's current nonce.
//! - `approve_transaction` / `exec_transaction_if_approved`: owners record
//!   approvals of a digest over a transaction with a caller-chosen nonce, and
//!   anyone triggers it once enough owners approved.
//!
//! Enabled modules bypass both flows through `execute_from_module`. Every
//! rejection happens before any state changes; a failing inner call is not a
//! rejection and still consumes the nonce or digest.

pub mod context;
pub mod management;

use crate::approvals::ApprovalBook;
use crate::environment::{Environment, InMemoryEnvironment};
use crate::event_bus::EventBus;
use crate::modules::ModuleRegistry;
use crate::owners::OwnerRegistry;
use crate::state::{WalletSettings, WalletSnapshot, WalletState};
use context::WalletContext;
use safe_account::recover_signer;
use safe_modules::SafeModule;
use safe_types::{
	truncate_id, Address, AuthorizationFlow, Bytes, ExecutionOutcome, ModuleContext, Operation,
	SafeError, SafeEvent, SafeTransaction, Signature, TransactionHasher, B256, U256,
};
use std::collections::BTreeMap;
use tokio::sync::broadcast;
use tracing::instrument;

/// Parameters of a new wallet.
#[derive(Debug, Clone)]
pub struct SafeSetup {
	pub address: Address,
	pub owners: Vec<Address>,
	pub threshold: usize,
	pub settings: WalletSettings,
}

/// A custody wallet running on environment `E`.
pub struct Safe<E: Environment = InMemoryEnvironment> {
	state: WalletState,
	hasher: TransactionHasher,
	env: E,
	/// Hosted modules. A slot is empty while its module is running.
	hosted: BTreeMap<Address, Option<Box<dyn SafeModule>>>,
	event_bus: EventBus,
}

impl<E: Environment> Safe<E> {
	/// Creates a wallet with the given owners and no modules.
	pub fn new(setup: SafeSetup, env: E) -> Result<Self, SafeError> {
		let owners = OwnerRegistry::new(setup.owners, setup.threshold, setup.address)
			.map_err(|e| SafeError::InvalidSetup(e.to_string()))?;
		let state = WalletState {
			address: setup.address,
			chain_id: env.chain_id(),
			owners,
			modules: ModuleRegistry::new(),
			nonce: U256::ZERO,
			approvals: ApprovalBook::new(),
			settings: setup.settings,
		};
		tracing::info!(
			wallet = %state.address,
			chain_id = state.chain_id,
			owners = state.owners.len(),
			threshold = state.owners.threshold(),
			"Wallet set up"
		);
		Ok(Self::from_parts(state, env))
	}

	/// Resumes a wallet from previously captured state.
	pub fn from_state(state: WalletState, env: E) -> Result<Self, SafeError> {
		state.validate()?;
		if state.chain_id != env.chain_id() {
			return Err(SafeError::InvalidSetup(format!(
				"wallet state is bound to chain {}, environment runs chain {}",
				state.chain_id,
				env.chain_id()
			)));
		}
		Ok(Self::from_parts(state, env))
	}

	fn from_parts(state: WalletState, env: E) -> Self {
		Self {
			hasher: TransactionHasher::new(state.chain_id, state.address),
			state,
			env,
			hosted: BTreeMap::new(),
			event_bus: EventBus::default(),
		}
	}

	/// Hosts `module` at its address, optionally enabling it.
	///
	/// Hosting stands in for deploying the module; enabling here is the
	/// setup-time path; later changes go through `enableModule`.
	pub fn install_module(
		&mut self,
		module: Box<dyn SafeModule>,
		enable: bool,
	) -> Result<(), SafeError> {
		let address = module.address();
		if self.hosted.contains_key(&address) {
			return Err(SafeError::InvalidSetup(format!(
				"a module is already hosted at {}",
				address
			)));
		}
		if enable && !self.state.modules.is_enabled(&address) {
			self.state
				.modules
				.enable(address, self.state.address)
				.map_err(|e| SafeError::InvalidSetup(e.to_string()))?;
		}
		tracing::info!(module = %address, name = module.name(), enabled = enable, "Module installed");
		self.hosted.insert(address, Some(module));
		Ok(())
	}

	pub fn address(&self) -> Address {
		self.state.address
	}

	pub fn owners(&self) -> &[Address] {
		self.state.owners.owners()
	}

	pub fn threshold(&self) -> usize {
		self.state.owners.threshold()
	}

	pub fn nonce(&self) -> U256 {
		self.state.nonce
	}

	pub fn is_owner(&self, address: &Address) -> bool {
		self.state.owners.is_owner(address)
	}

	/// Enabled modules, most recently enabled first.
	pub fn modules(&self) -> &[Address] {
		self.state.modules.modules()
	}

	pub fn is_module_enabled(&self, module: &Address) -> bool {
		self.state.modules.is_enabled(module)
	}

	pub fn settings(&self) -> &WalletSettings {
		&self.state.settings
	}

	pub fn state(&self) -> &WalletState {
		&self.state
	}

	pub fn hasher(&self) -> &TransactionHasher {
		&self.hasher
	}

	/// Digest owners sign for the signature flow.
	pub fn get_transaction_hash(&self, tx: &SafeTransaction) -> B256 {
		self.hasher.digest(AuthorizationFlow::Signatures, tx)
	}

	/// Digest owners approve for the on-chain approval flow.
	pub fn get_approval_hash(&self, tx: &SafeTransaction) -> B256 {
		self.hasher.digest(AuthorizationFlow::Approvals, tx)
	}

	/// Owners that approved `digest`, in approval order.
	pub fn approvals(&self, digest: &B256) -> &[Address] {
		self.state.approvals.approvers(digest)
	}

	pub fn is_executed(&self, digest: &B256) -> bool {
		self.state.approvals.is_executed(digest)
	}

	pub fn env(&self) -> &E {
		&self.env
	}

	pub fn env_mut(&mut self) -> &mut E {
		&mut self.env
	}

	pub fn subscribe(&self) -> broadcast::Receiver<SafeEvent> {
		self.event_bus.subscribe()
	}

	/// Hosted module of type `M` at `address`.
	pub fn module<M: SafeModule>(&self, address: Address) -> Result<&M, SafeError> {
		self.hosted
			.get(&address)
			.and_then(Option::as_ref)
			.and_then(|m| m.as_any().downcast_ref::<M>())
			.ok_or(SafeError::ModuleNotFound(address))
	}

	/// Runs `f` on the hosted module of type `M` at `address`, handing it a
	/// context bound to that address.
	pub fn with_module<M, R, F>(&mut self, address: Address, f: F) -> Result<R, SafeError>
	where
		M: SafeModule,
		F: FnOnce(&mut M, &mut dyn ModuleContext) -> R,
	{
		let mut module = self
			.hosted
			.get_mut(&address)
			.and_then(Option::take)
			.ok_or(SafeError::ModuleNotFound(address))?;

		let result = match module.as_any_mut().downcast_mut::<M>() {
			Some(typed) => {
				let mut ctx = WalletContext::new(self, address);
				Ok(f(typed, &mut ctx))
			},
			None => Err(SafeError::ModuleNotFound(address)),
		};
		self.hosted.insert(address, Some(module));
		result
	}

	/// Executes `tx` authorized by a bundle of owner signatures.
	///
	/// `tx.nonce` must be the wallet's current nonce and the signatures must
	/// be ordered by strictly increasing signer address.
	#[instrument(skip_all, fields(wallet = %self.state.address, nonce = %tx.nonce))]
	pub fn exec_transaction(
		&mut self,
		tx: &SafeTransaction,
		signatures: &[Signature],
	) -> Result<ExecutionOutcome, SafeError> {
		self.check_operation(tx.operation)?;
		if tx.nonce != self.state.nonce {
			return Err(SafeError::InvalidNonce {
				expected: self.state.nonce,
				got: tx.nonce,
			});
		}

		let threshold = self.state.owners.threshold();
		if signatures.len() < threshold {
			return Err(SafeError::InsufficientApprovals {
				have: signatures.len(),
				need: threshold,
			});
		}

		let digest = self.get_transaction_hash(tx);
		let mut last = Address::ZERO;
		for signature in signatures {
			let signer = recover_signer(&digest, signature)
				.map_err(|e| SafeError::InvalidSignature(e.to_string()))?;
			if signer <= last {
				return Err(SafeError::InvalidSignature(format!(
					"signer {} is out of order or duplicated",
					signer
				)));
			}
			if !self.state.owners.is_owner(&signer) {
				return Err(SafeError::InvalidSignature(format!(
					"signer {} is not an owner",
					signer
				)));
			}
			last = signer;
		}

		self.state.nonce += U256::from(1u64);
		Ok(self.run(digest, tx))
	}

	/// Records `sender`'s approval of `tx` and returns the approval digest.
	#[instrument(skip_all, fields(wallet = %self.state.address, sender = %sender))]
	pub fn approve_transaction(
		&mut self,
		sender: Address,
		tx: &SafeTransaction,
	) -> Result<B256, SafeError> {
		if !self.state.owners.is_owner(&sender) {
			return Err(SafeError::NotAnOwner(sender));
		}
		let digest = self.get_approval_hash(tx);
		if self.state.approvals.is_executed(&digest) {
			return Err(SafeError::AlreadyExecuted);
		}

		if self.state.approvals.approve(digest, sender) {
			tracing::info!(
				digest = %truncate_id(&digest.to_string()),
				approver = %sender,
				"Transaction approved"
			);
			self.emit(SafeEvent::Approval {
				digest,
				approver: sender,
			});
		}
		Ok(digest)
	}

	/// Executes `tx` once enough current owners approved it.
	///
	/// Anyone may call this; an owner calling it counts as approving.
	#[instrument(skip_all, fields(wallet = %self.state.address, sender = %sender))]
	pub fn exec_transaction_if_approved(
		&mut self,
		sender: Address,
		tx: &SafeTransaction,
	) -> Result<ExecutionOutcome, SafeError> {
		let digest = self.get_approval_hash(tx);
		if self.state.approvals.is_executed(&digest) {
			return Err(SafeError::AlreadyExecuted);
		}
		self.check_operation(tx.operation)?;

		let owners = &self.state.owners;
		let sender_is_owner = owners.is_owner(&sender);
		let mut have = self
			.state
			.approvals
			.count_where(&digest, |a| *a != sender && owners.is_owner(a));
		if sender_is_owner {
			have += 1;
		}
		let need = owners.threshold();
		if have < need {
			return Err(SafeError::InsufficientApprovals { have, need });
		}

		if sender_is_owner && self.state.approvals.approve(digest, sender) {
			self.emit(SafeEvent::Approval {
				digest,
				approver: sender,
			});
		}
		self.state.approvals.mark_executed(digest);
		Ok(self.run(digest, tx))
	}

	/// Performs an operation for `module` without a quorum check.
	///
	/// `module` must be enabled at the time of the call. Modules reach this
	/// only through their `WalletContext`.
	pub(crate) fn execute_from_module(
		&mut self,
		module: Address,
		to: Address,
		value: U256,
		data: Bytes,
		operation: Operation,
	) -> Result<ExecutionOutcome, SafeError> {
		if !self.state.modules.is_enabled(&module) {
			return Err(SafeError::NotAModule(module));
		}
		self.check_operation(operation)?;

		let outcome = self.perform(to, value, &data, operation);
		if outcome.success {
			tracing::debug!(module = %module, to = %to, value = %value, "Module transaction executed");
			self.emit(SafeEvent::ExecutionFromModuleSuccess { module });
		} else {
			tracing::warn!(
				module = %module,
				to = %to,
				error = outcome.error.as_deref().unwrap_or("unknown"),
				"Module transaction failed"
			);
			self.emit(SafeEvent::ExecutionFromModuleFailure { module });
		}
		Ok(outcome)
	}

	pub(crate) fn emit(&self, event: SafeEvent) {
		self.event_bus.publish(event).ok();
	}

	fn check_operation(&self, operation: Operation) -> Result<(), SafeError> {
		if operation == Operation::DelegateCall && !self.state.settings.allow_delegate_call {
			return Err(SafeError::OperationNotPermitted(
				"delegate calls are disabled on this wallet".to_string(),
			));
		}
		Ok(())
	}

	/// Performs an authorized transaction and reports the result.
	fn run(&mut self, digest: B256, tx: &SafeTransaction) -> ExecutionOutcome {
		let outcome = self.perform(tx.to, tx.value, &tx.data, tx.operation);
		let digest_id = truncate_id(&digest.to_string());
		if outcome.success {
			tracing::info!(
				digest = %digest_id,
				to = %tx.to,
				operation = %tx.operation,
				"Transaction executed"
			);
			self.emit(SafeEvent::ExecutionSuccess {
				digest,
				outcome: outcome.clone(),
			});
		} else {
			let reason = outcome
				.error
				.clone()
				.unwrap_or_else(|| "unknown".to_string());
			tracing::warn!(digest = %digest_id, to = %tx.to, error = %reason, "Transaction failed");
			self.emit(SafeEvent::ExecutionFailure { digest, reason });
		}
		outcome
	}

	fn perform(
		&mut self,
		to: Address,
		value: U256,
		data: &Bytes,
		operation: Operation,
	) -> ExecutionOutcome {
		let wallet = self.state.address;
		match operation {
			Operation::Call if to == wallet => match management::dispatch(self, data) {
				Ok(output) => ExecutionOutcome::succeeded(output),
				Err(e) => ExecutionOutcome::failed(e.to_string()),
			},
			Operation::Call if self.hosted.contains_key(&to) => self.call_module(to, value, data),
			Operation::Call => match self.env.call(wallet, to, value, data) {
				Ok(output) => ExecutionOutcome::succeeded(output),
				Err(e) => ExecutionOutcome::failed(e.to_string()),
			},
			Operation::DelegateCall => match self.env.delegate_call(wallet, to, data) {
				Ok(output) => ExecutionOutcome::succeeded(output),
				Err(e) => ExecutionOutcome::failed(e.to_string()),
			},
			Operation::Create => match self.env.create(wallet, value, data) {
				Ok(created) => {
					tracing::info!(wallet = %wallet, created = %created, "Contract created");
					ExecutionOutcome::created(created)
				},
				Err(e) => ExecutionOutcome::failed(e.to_string()),
			},
		}
	}

	/// Forwards a wallet call to the hosted module at `address`.
	fn call_module(&mut self, address: Address, value: U256, data: &Bytes) -> ExecutionOutcome {
		let wallet = self.state.address;
		let Some(mut module) = self.hosted.get_mut(&address).and_then(Option::take) else {
			return ExecutionOutcome::failed(format!("module {} is already executing", address));
		};

		if let Err(e) = self.env.call(wallet, address, value, &[]) {
			self.hosted.insert(address, Some(module));
			return ExecutionOutcome::failed(e.to_string());
		}

		let result = {
			let mut ctx = WalletContext::new(self, address);
			module.on_wallet_call(&mut ctx, value, data)
		};
		self.hosted.insert(address, Some(module));

		match result {
			Ok(output) => ExecutionOutcome::succeeded(output),
			Err(e) => {
				if let Err(refund) = self.env.call(address, wallet, value, &[]) {
					tracing::error!(module = %address, error = %refund, "Failed to refund module call value");
				}
				ExecutionOutcome::failed(e.to_string())
			},
		}
	}

	/// Captures the private state of every hosted module.
	pub fn module_states(&self) -> Result<BTreeMap<Address, serde_json::Value>, SafeError> {
		let mut states = BTreeMap::new();
		for (address, slot) in &self.hosted {
			let module = slot.as_ref().ok_or(SafeError::ModuleNotFound(*address))?;
			let state = module
				.snapshot()
				.map_err(|e| SafeError::InvalidSetup(e.to_string()))?;
			states.insert(*address, state);
		}
		Ok(states)
	}

	/// Loads captured state into the hosted modules.
	pub fn restore_module_states(
		&mut self,
		states: BTreeMap<Address, serde_json::Value>,
	) -> Result<(), SafeError> {
		for (address, state) in states {
			let module = self
				.hosted
				.get_mut(&address)
				.and_then(Option::as_mut)
				.ok_or(SafeError::ModuleNotFound(address))?;
			module
				.restore(state)
				.map_err(|e| SafeError::InvalidSetup(e.to_string()))?;
		}
		Ok(())
	}
}

impl Safe<InMemoryEnvironment> {
	/// Captures the wallet, its modules and the in-memory ledger.
	pub fn snapshot(&self) -> Result<WalletSnapshot, SafeError> {
		Ok(WalletSnapshot {
			state: self.state.clone(),
			modules: self.module_states()?,
			environment: self.env.export(),
		})
	}

	/// Rebuilds a wallet from `snapshot`, hosting `modules` with their
	/// captured state.
	pub fn restore(
		snapshot: WalletSnapshot,
		modules: Vec<Box<dyn SafeModule>>,
	) -> Result<Self, SafeError> {
		let env = InMemoryEnvironment::from_state(snapshot.environment);
		let mut safe = Self::from_state(snapshot.state, env)?;
		for module in modules {
			safe.install_module(module, false)?;
		}
		safe.restore_module_states(snapshot.modules)?;
		tracing::info!(
			wallet = %safe.address(),
			nonce = %safe.nonce(),
			modules = safe.hosted.len(),
			"Wallet restored"
		);
		Ok(safe)
	}
}
