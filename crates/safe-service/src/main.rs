//! Operator console for the custody wallet.
//!
//! The `safe` binary loads a wallet configuration, restores the wallet from
//! its stored snapshot (or sets it up on first use), applies one command and
//! persists the result. Signing commands take the key from `--private-key`
//! or `SAFE_PRIVATE_KEY`.

use clap::{Args as ClapArgs, Parser, Subcommand};
use safe_account::{encode_signature, order_by_signer, parse_signature, recover_signer};
use safe_config::Config;
use safe_core::{Environment, Safe, WalletStore};
use safe_modules::implementations::daily_limit::{DailyLimitModule, DelegatedTransfer};
use safe_types::{
	parse_address, parse_bytes, parse_u256, with_0x_prefix, Address, Bytes, Operation,
	SafeTransaction, SecretString, U256,
};
use std::path::PathBuf;

mod factory_registry;

use factory_registry::{local_account, open_wallet};

/// Command-line arguments for the wallet console.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

/// Transaction fields shared by the hashing, signing and execution commands.
#[derive(ClapArgs, Debug, Clone)]
struct TxArgs {
	/// Target address
	#[arg(long, value_parser = parse_address)]
	to: Address,

	/// Native value in base units
	#[arg(long, default_value = "0", value_parser = parse_u256)]
	value: U256,

	/// Hex call data or init code
	#[arg(long, default_value = "0x", value_parser = parse_bytes)]
	data: Bytes,

	/// call, delegate_call or create
	#[arg(long, default_value = "call")]
	operation: Operation,

	/// Nonce; defaults to the wallet nonce for signature bundles
	#[arg(long, value_parser = parse_u256)]
	nonce: Option<U256>,

	/// Use the on-chain approval flow instead of a signature bundle
	#[arg(long)]
	approval: bool,
}

impl TxArgs {
	fn transaction(&self, safe: &Safe) -> Result<SafeTransaction, Box<dyn std::error::Error>> {
		let nonce = match self.nonce {
			Some(nonce) => nonce,
			None if self.approval => {
				return Err("--nonce is required for the approval flow".into());
			},
			None => safe.nonce(),
		};
		Ok(SafeTransaction::call(self.to, self.value, self.data.clone())
			.with_operation(self.operation)
			.with_nonce(nonce))
	}

	fn digest(&self, safe: &Safe, tx: &SafeTransaction) -> safe_types::B256 {
		if self.approval {
			safe.get_approval_hash(tx)
		} else {
			safe.get_transaction_hash(tx)
		}
	}
}

#[derive(ClapArgs, Debug, Clone)]
struct KeyArgs {
	/// Hex private key of the signing owner or operator
	#[arg(long, env = "SAFE_PRIVATE_KEY", hide_env_values = true)]
	private_key: Option<String>,
}

impl KeyArgs {
	fn secret(&self) -> Result<SecretString, Box<dyn std::error::Error>> {
		self.private_key
			.as_deref()
			.map(SecretString::from)
			.ok_or_else(|| "a private key is required (--private-key or SAFE_PRIVATE_KEY)".into())
	}
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Sets up the configured wallet and stores it
	Init,
	/// Prints owners, threshold, nonce, modules and balances
	Status,
	/// Credits native value to the wallet
	Deposit {
		#[arg(value_parser = parse_u256)]
		amount: U256,
	},
	/// Prints the digest owners sign or approve
	Hash {
		#[command(flatten)]
		tx: TxArgs,
	},
	/// Signs the wallet digest of a transaction
	Sign {
		#[command(flatten)]
		tx: TxArgs,
		#[command(flatten)]
		key: KeyArgs,
	},
	/// Records the key holder's on-chain approval of a transaction
	Approve {
		#[command(flatten)]
		tx: TxArgs,
		#[command(flatten)]
		key: KeyArgs,
	},
	/// Executes a transaction with a signature bundle or recorded approvals
	Exec {
		#[command(flatten)]
		tx: TxArgs,
		/// Owner signatures as 65-byte hex, in any order
		#[arg(long = "signature")]
		signatures: Vec<String>,
		#[command(flatten)]
		key: KeyArgs,
	},
	/// Withdraws within a daily limit, signed by the module operator
	Withdraw {
		/// Address of the daily-limit module
		#[arg(long, value_parser = parse_address)]
		module: Address,
		#[arg(long, value_parser = parse_address)]
		to: Address,
		#[arg(long, value_parser = parse_u256)]
		amount: U256,
		/// Token contract; native currency when omitted
		#[arg(long, value_parser = parse_address)]
		token: Option<Address>,
		#[command(flatten)]
		key: KeyArgs,
	},
	/// Prints the daily limits of a module
	Limit {
		#[arg(long, value_parser = parse_address)]
		module: Address,
	},
}

impl Command {
	/// Whether the command changes wallet state.
	fn mutates(&self) -> bool {
		matches!(
			self,
			Command::Init
				| Command::Deposit { .. }
				| Command::Approve { .. }
				| Command::Exec { .. }
				| Command::Withdraw { .. }
		)
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let config_path = args
		.config
		.to_str()
		.ok_or("configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	let wallet_id = config.wallet.id.clone();
	tracing::info!("Loaded configuration [{}]", wallet_id);

	let (mut safe, store) = open_wallet(config).await?;
	let mutates = args.command.mutates();
	run(&mut safe, args.command).await?;

	if mutates {
		persist(&safe, &store, &wallet_id).await?;
	}
	Ok(())
}

async fn persist(
	safe: &Safe,
	store: &WalletStore,
	wallet_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
	store.save(wallet_id, &safe.snapshot()?).await?;
	tracing::info!(wallet_id = %wallet_id, nonce = %safe.nonce(), "Stored wallet");
	Ok(())
}

async fn run(safe: &mut Safe, command: Command) -> Result<(), Box<dyn std::error::Error>> {
	match command {
		Command::Init => {
			println!("wallet {} ready on chain {}", safe.address(), safe.hasher().chain_id());
		},
		Command::Status => print_status(safe)?,
		Command::Deposit { amount } => {
			let wallet = safe.address();
			safe.env_mut().deposit(wallet, amount);
			println!("balance {}", safe.env().balance(wallet));
		},
		Command::Hash { tx } => {
			let transaction = tx.transaction(safe)?;
			println!("{}", tx.digest(safe, &transaction));
		},
		Command::Sign { tx, key } => {
			let transaction = tx.transaction(safe)?;
			let digest = tx.digest(safe, &transaction);
			let account = local_account(&key.secret()?)?;
			let signature = account.sign(&digest).await?;
			println!("signer    {}", account.get_address().await?);
			println!("nonce     {}", transaction.nonce);
			println!("signature {}", encode_signature(&signature));
		},
		Command::Approve { tx, key } => {
			let transaction = tx.transaction(safe)?;
			let account = local_account(&key.secret()?)?;
			let owner = account.get_address().await?;
			let digest = safe.approve_transaction(owner, &transaction)?;
			println!(
				"approved {} ({} of {})",
				digest,
				safe.approvals(&digest).len(),
				safe.threshold()
			);
		},
		Command::Exec {
			tx,
			signatures,
			key,
		} => {
			let transaction = tx.transaction(safe)?;
			let outcome = if tx.approval {
				// Anyone may trigger execution; an owner's key also counts as an approval.
				let sender = match key.private_key {
					Some(_) => local_account(&key.secret()?)?.get_address().await?,
					None => Address::ZERO,
				};
				safe.exec_transaction_if_approved(sender, &transaction)?
			} else {
				let digest = safe.get_transaction_hash(&transaction);
				let signed = signatures
					.iter()
					.map(|raw| {
						let signature = parse_signature(&parse_bytes(raw)?)
							.map_err(|e| e.to_string())?;
						let signer = recover_signer(&digest, &signature).map_err(|e| e.to_string())?;
						Ok::<_, String>((signer, signature))
					})
					.collect::<Result<Vec<_>, _>>()?;
				safe.exec_transaction(&transaction, &order_by_signer(signed))?
			};
			print_outcome(&outcome);
		},
		Command::Withdraw {
			module,
			to,
			amount,
			token,
			key,
		} => {
			let transfer = match token {
				Some(token) => DelegatedTransfer::token(token, to, amount),
				None => DelegatedTransfer::native(to, amount),
			};
			let digest = {
				let limits = safe.module::<DailyLimitModule>(module)?;
				limits.get_transaction_hash(&transfer, limits.next_nonce())
			};
			let signature = local_account(&key.secret()?)?.sign(&digest).await?;
			let outcome = safe.with_module::<DailyLimitModule, _, _>(module, |limits, ctx| {
				limits.execute_with_signature(ctx, &transfer, &signature)
			})??;
			print_outcome(&outcome);
		},
		Command::Limit { module } => {
			let limits = safe.module::<DailyLimitModule>(module)?;
			let day = safe_types::day_index(safe.env().timestamp());
			println!("operator {}", limits.operator());
			for (asset, entry) in limits.daily_limits() {
				println!(
					"{} limit {} spent {} remaining {}",
					asset,
					entry.limit,
					entry.spent_on(day),
					entry.remaining(day)
				);
			}
		},
	}
	Ok(())
}

fn print_status(safe: &Safe) -> Result<(), Box<dyn std::error::Error>> {
	let status = serde_json::json!({
		"address": safe.address(),
		"chain_id": safe.hasher().chain_id(),
		"owners": safe.owners(),
		"threshold": safe.threshold(),
		"nonce": safe.nonce(),
		"modules": safe.modules(),
		"balance": safe.env().balance(safe.address()),
		"delegate_call": safe.settings().allow_delegate_call,
	});
	println!("{}", serde_json::to_string_pretty(&status)?);
	Ok(())
}

fn print_outcome(outcome: &safe_types::ExecutionOutcome) {
	match (&outcome.created, &outcome.error) {
		(Some(created), _) => println!("created {}", created),
		(None, Some(error)) if !outcome.success => println!("failed: {}", error),
		_ => println!(
			"success {}",
			with_0x_prefix(&alloy_primitives::hex::encode(&outcome.return_data))
		),
	}
}
