//! Serialized access to a registry from several threads.
//!
//! [`SharedRegistry`] is a cloneable handle around one [`Registry`].
//! Mutating calls take the write lock for their whole check-then-mutate
//! sequence, so they are applied strictly one after another and no caller
//! ever sees a half-applied registration or attestation. Queries share the
//! read lock.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::account::{AccountAttestors, AccountInfo};
use crate::config::RegistryConfig;
use crate::error::Result;
use crate::event::{EventLog, EventSink};
use crate::principal::Principal;
use crate::registry::Registry;

/// Cloneable, thread-safe handle to a [`Registry`].
#[derive(Debug)]
pub struct SharedRegistry<S = EventLog> {
    inner: Arc<RwLock<Registry<S>>>,
}

impl<S> Clone for SharedRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> From<Registry<S>> for SharedRegistry<S> {
    fn from(registry: Registry<S>) -> Self {
        Self::new(registry)
    }
}

impl<S> SharedRegistry<S> {
    /// Wrap an existing registry.
    pub fn new(registry: Registry<S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Run `f` with shared access to the registry under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&Registry<S>) -> R) -> R {
        f(&*self.inner.read())
    }

    /// Run `f` with exclusive access to the registry under the write lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut Registry<S>) -> R) -> R {
        f(&mut *self.inner.write())
    }

    /// Copy of the immutable configuration.
    pub fn get_registry_config(&self) -> RegistryConfig {
        self.read(|r| r.get_registry_config().clone())
    }

    /// See [`Registry::is_attestor`].
    pub fn is_attestor(&self, identity: &Principal) -> bool {
        self.read(|r| r.is_attestor(identity))
    }

    /// See [`Registry::get_account_by_owner`].
    pub fn get_account_by_owner(&self, owner: &Principal) -> Option<Principal> {
        self.read(|r| r.get_account_by_owner(owner).cloned())
    }

    /// See [`Registry::get_account_by_agent`].
    pub fn get_account_by_agent(&self, agent: &Principal) -> Option<Principal> {
        self.read(|r| r.get_account_by_agent(agent).cloned())
    }

    /// See [`Registry::get_account_info`].
    pub fn get_account_info(&self, owner: &Principal) -> Option<AccountInfo> {
        self.read(|r| r.get_account_info(owner))
    }

    /// See [`Registry::get_attestation_level`].
    pub fn get_attestation_level(&self, owner: &Principal) -> Option<u32> {
        self.read(|r| r.get_attestation_level(owner))
    }

    /// See [`Registry::is_account_attested`].
    pub fn is_account_attested(&self, owner: &Principal, threshold: u32) -> bool {
        self.read(|r| r.is_account_attested(owner, threshold))
    }

    /// See [`Registry::has_attestor_signed`].
    pub fn has_attestor_signed(&self, owner: &Principal, attestor: &Principal) -> bool {
        self.read(|r| r.has_attestor_signed(owner, attestor))
    }

    /// See [`Registry::get_account_attestors`].
    pub fn get_account_attestors(&self, owner: &Principal) -> Option<AccountAttestors> {
        self.read(|r| r.get_account_attestors(owner))
    }

    /// Return the number of registered accounts.
    pub fn len(&self) -> usize {
        self.read(|r| r.len())
    }

    /// Return `true` when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.read(|r| r.is_empty())
    }
}

impl<S: EventSink> SharedRegistry<S> {
    /// See [`Registry::register`].
    pub fn register(
        &self,
        caller: &Principal,
        owner: Principal,
        agent: Principal,
    ) -> Result<Principal> {
        self.write(|r| r.register(caller, owner, agent))
    }

    /// See [`Registry::attest`].
    pub fn attest(&self, caller: &Principal, owner: &Principal) -> Result<u32> {
        self.write(|r| r.attest(caller, owner))
    }
}
