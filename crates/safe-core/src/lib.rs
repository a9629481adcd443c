//! Core engine of the multi-party custody wallet.
//!
//! This crate holds the wallet itself: the owner set and threshold, the
//! enabled module set, approval records, the authorization and execution
//! engine, the environment abstraction it performs operations through, and
//! the builder that assembles a wallet from configuration.

pub mod approvals;
pub mod builder;
pub mod engine;
pub mod environment;
pub mod event_bus;
pub mod modules;
pub mod owners;
pub mod persistence;
pub mod state;

pub use approvals::{ApprovalBook, ApprovalRecord};
pub use builder::{BuilderError, ConfiguredModule, SafeBuilder, SafeFactories};
pub use engine::context::WalletContext;
pub use engine::management::ManagementError;
pub use engine::{Safe, SafeSetup};
pub use environment::{Contract, Environment, EnvironmentError, EnvironmentState, InMemoryEnvironment};
pub use event_bus::EventBus;
pub use modules::{ModuleRegistry, ModuleRegistryError};
pub use owners::{OwnerError, OwnerRegistry};
pub use persistence::WalletStore;
pub use state::{WalletSettings, WalletSnapshot, WalletState};
