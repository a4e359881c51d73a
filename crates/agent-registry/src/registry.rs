//! Registry operations: registration, attestation, and queries.
//!
//! Every mutating operation follows the same shape: check the caller
//! against the configuration, check and mutate the account store, then
//! emit exactly one event. A rejected operation writes nothing and emits
//! nothing.

use crate::account::{AccountAttestors, AccountInfo, AccountRecord};
use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::event::{EventLog, EventSink, RegistryEvent};
use crate::principal::Principal;
use crate::store::AccountStore;

/// The owner/agent registry: immutable configuration, the account store,
/// and the sink that receives events.
#[derive(Debug, Clone)]
pub struct Registry<S = EventLog> {
    config: RegistryConfig,
    accounts: AccountStore,
    sink: S,
}

impl Registry<EventLog> {
    /// Create an empty registry that buffers events in an [`EventLog`].
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_sink(config, EventLog::new())
    }
}

impl<S> Registry<S> {
    /// Create an empty registry that emits into `sink`.
    pub fn with_sink(config: RegistryConfig, sink: S) -> Self {
        Self {
            config,
            accounts: AccountStore::new(),
            sink,
        }
    }

    /// Reassemble a registry from previously persisted parts.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidFileFormat` if any record breaks an
    /// invariant under `config` (foreign signer, level out of step with its
    /// signatures).
    pub fn from_parts(config: RegistryConfig, accounts: AccountStore, sink: S) -> Result<Self> {
        for record in accounts.iter() {
            record
                .check(&config)
                .map_err(RegistryError::InvalidFileFormat)?;
        }
        Ok(Self {
            config,
            accounts,
            sink,
        })
    }

    /// Split the registry back into its parts.
    pub fn into_parts(self) -> (RegistryConfig, AccountStore, S) {
        (self.config, self.accounts, self.sink)
    }

    /// The account store.
    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    /// The event sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the event sink (e.g. to drain an [`EventLog`]).
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Snapshot of the immutable configuration.
    pub fn get_registry_config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Return `true` if `identity` is a configured attestor.
    pub fn is_attestor(&self, identity: &Principal) -> bool {
        self.config.is_attestor(identity)
    }

    /// The registrar's identity if `owner` has a record.
    pub fn get_account_by_owner(&self, owner: &Principal) -> Option<&Principal> {
        self.accounts.get(owner).map(|_| self.config.registrar())
    }

    /// The registrar's identity if `agent` is bound to some owner.
    pub fn get_account_by_agent(&self, agent: &Principal) -> Option<&Principal> {
        self.accounts
            .owner_of(agent)
            .map(|_| self.config.registrar())
    }

    /// The owner bound to `agent`.
    pub fn get_owner_by_agent(&self, agent: &Principal) -> Option<&Principal> {
        self.accounts.owner_of(agent)
    }

    /// `{owner, agent, attestation_level}` for `owner`.
    pub fn get_account_info(&self, owner: &Principal) -> Option<AccountInfo> {
        self.accounts.get(owner).map(AccountRecord::info)
    }

    /// Current attestation level of `owner`'s record.
    pub fn get_attestation_level(&self, owner: &Principal) -> Option<u32> {
        self.accounts.get(owner).map(|r| r.attestation_level)
    }

    /// Return `true` if `owner` has a record whose level is at least
    /// `threshold`. Missing records are simply not attested.
    pub fn is_account_attested(&self, owner: &Principal, threshold: u32) -> bool {
        self.accounts
            .get(owner)
            .is_some_and(|r| r.attestation_level >= threshold)
    }

    /// Return `true` if `attestor` is configured and has signed `owner`'s
    /// record.
    pub fn has_attestor_signed(&self, owner: &Principal, attestor: &Principal) -> bool {
        self.config.is_attestor(attestor)
            && self
                .accounts
                .get(owner)
                .is_some_and(|r| r.has_signed(attestor))
    }

    /// Per-attestor signature flags for `owner`, or `None` if unregistered.
    pub fn get_account_attestors(&self, owner: &Principal) -> Option<AccountAttestors> {
        self.accounts
            .get(owner)
            .map(|r| AccountAttestors::for_record(&self.config, r))
    }

    /// Full record for `owner`.
    pub fn get_record(&self, owner: &Principal) -> Option<&AccountRecord> {
        self.accounts.get(owner)
    }

    /// Return the number of registered accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Return `true` when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl<S: EventSink> Registry<S> {
    /// Bind `owner` to `agent`. Only the registrar may call this.
    ///
    /// Returns the registrar's identity as acknowledgment and emits
    /// `account-registered`.
    ///
    /// # Errors
    ///
    /// - `NotAuthorizedRegistrar` if `caller` is not the registrar.
    /// - `InvalidBinding` if `owner == agent`.
    /// - `AlreadyRegistered` if either identity is already bound.
    pub fn register(
        &mut self,
        caller: &Principal,
        owner: Principal,
        agent: Principal,
    ) -> Result<Principal> {
        if !self.config.is_registrar(caller) {
            return Err(rejected(
                "register",
                RegistryError::NotAuthorizedRegistrar(caller.clone()),
            ));
        }

        let record = AccountRecord::new(owner.clone(), agent.clone());
        let attestation_level = record.attestation_level;
        self.accounts
            .insert(record)
            .map_err(|e| rejected("register", e))?;

        log::info!("registered owner {owner} with agent {agent}");
        self.sink.emit(RegistryEvent::AccountRegistered {
            owner,
            agent,
            attestation_level,
        });

        Ok(self.config.registrar().clone())
    }

    /// Sign `owner`'s binding as `caller`. Only configured attestors may
    /// call this, and each only once per account.
    ///
    /// Returns the new attestation level and emits `account-attested`.
    ///
    /// # Errors
    ///
    /// - `NotAttestor` if `caller` is not a configured attestor (checked
    ///   before the account is looked up).
    /// - `AccountNotFound` if `owner` has no record.
    /// - `AlreadyRegistered` if `caller` already signed this record.
    pub fn attest(&mut self, caller: &Principal, owner: &Principal) -> Result<u32> {
        if !self.config.is_attestor(caller) {
            return Err(rejected("attest", RegistryError::NotAttestor(caller.clone())));
        }

        let record = self.accounts.get_mut(owner).ok_or_else(|| {
            rejected("attest", RegistryError::AccountNotFound(owner.clone()))
        })?;

        let new_level = record
            .add_signature(caller.clone())
            .ok_or_else(|| rejected("attest", RegistryError::AlreadyRegistered))?;

        log::info!("attestor {caller} signed {owner}, level now {new_level}");
        self.sink.emit(RegistryEvent::AccountAttested {
            owner: owner.clone(),
            attestor: caller.clone(),
            new_attestation_level: new_level,
        });

        Ok(new_level)
    }
}

/// Log a rejected operation and hand the error back.
fn rejected(operation: &str, err: RegistryError) -> RegistryError {
    log::debug!("{operation} rejected ({}): {err}", err.code());
    err
}
