//! Agent Registry: owner-to-agent bindings with multi-party attestation.
//!
//! A single registrar binds an owner identity to a delegated agent
//! identity. A fixed, ordered set of attestors may each vouch for a
//! binding once, raising its attestation level from 1 up to
//! `1 + number of attestors`.
//!
//! ```
//! use agent_registry::{Principal, Registry, RegistryConfig};
//!
//! let registrar = Principal::new("deployer").unwrap();
//! let attestor = Principal::new("attestor-a").unwrap();
//! let config = RegistryConfig::new(registrar.clone(), vec![attestor.clone()]).unwrap();
//! let mut registry = Registry::new(config);
//!
//! let owner = Principal::new("owner").unwrap();
//! let agent = Principal::new("agent").unwrap();
//! registry.register(&registrar, owner.clone(), agent).unwrap();
//! assert_eq!(registry.attest(&attestor, &owner).unwrap(), 2);
//! assert!(registry.is_account_attested(&owner, 2));
//! ```

pub mod account;
pub mod config;
pub mod error;
pub mod event;
pub mod principal;
pub mod registry;
pub mod shared;
pub mod storage;
pub mod store;
pub mod time;

// Re-export primary types
pub use account::{AccountAttestors, AccountInfo, AccountRecord, AttestorStatus};
pub use config::RegistryConfig;
pub use error::{RegistryError, Result};
pub use event::{EventLog, EventSink, LogSink, RegistryEvent};
pub use principal::Principal;
pub use registry::Registry;
pub use shared::SharedRegistry;
pub use storage::{RegistryStore, StoreLock};
pub use store::AccountStore;
