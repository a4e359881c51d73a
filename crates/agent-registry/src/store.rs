//! Account store: the owner index and the agent index.
//!
//! The store owns every [`AccountRecord`] and keeps two maps in step:
//!
//! - `by_owner`: owner → record (primary).
//! - `by_agent`: agent → owner (secondary, for reverse lookup).
//!
//! Both maps are `BTreeMap`s so iteration and snapshots come out in a
//! stable owner order. The store enforces uniqueness only; authorization
//! lives in [`crate::registry`].

use std::collections::BTreeMap;

use crate::account::AccountRecord;
use crate::error::{RegistryError, Result};
use crate::principal::Principal;

/// In-memory owner/agent index over [`AccountRecord`] records.
#[derive(Debug, Clone, Default)]
pub struct AccountStore {
    /// Primary store: owner → record.
    by_owner: BTreeMap<Principal, AccountRecord>,
    /// Secondary index: agent → owner.
    by_agent: BTreeMap<Principal, Principal>,
}

impl AccountStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a list of records.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::AlreadyRegistered` if two records collide on
    /// owner or agent, or `RegistryError::InvalidBinding` for a record bound
    /// to itself.
    pub fn from_records(records: impl IntoIterator<Item = AccountRecord>) -> Result<Self> {
        let mut store = Self::new();
        for record in records {
            store.insert(record)?;
        }
        Ok(store)
    }

    /// Insert a new binding into both indexes.
    ///
    /// Both identities are checked against both roles before anything is
    /// written, so a rejected insert leaves the store unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidBinding` if owner and agent are the
    /// same identity, or `RegistryError::AlreadyRegistered` if either
    /// identity is already bound as an owner or an agent.
    pub fn insert(&mut self, record: AccountRecord) -> Result<()> {
        if record.owner == record.agent {
            return Err(RegistryError::InvalidBinding(record.owner));
        }
        if self.is_bound(&record.owner) || self.is_bound(&record.agent) {
            return Err(RegistryError::AlreadyRegistered);
        }

        self.by_agent
            .insert(record.agent.clone(), record.owner.clone());
        self.by_owner.insert(record.owner.clone(), record);
        Ok(())
    }

    /// Look up a record by owner.
    pub fn get(&self, owner: &Principal) -> Option<&AccountRecord> {
        self.by_owner.get(owner)
    }

    /// Mutable access for attestation. Owner and agent must not be changed
    /// through this reference.
    pub(crate) fn get_mut(&mut self, owner: &Principal) -> Option<&mut AccountRecord> {
        self.by_owner.get_mut(owner)
    }

    /// Look up the owner bound to `agent`.
    pub fn owner_of(&self, agent: &Principal) -> Option<&Principal> {
        self.by_agent.get(agent)
    }

    /// Look up a record by its agent.
    pub fn get_by_agent(&self, agent: &Principal) -> Option<&AccountRecord> {
        self.owner_of(agent).and_then(|owner| self.by_owner.get(owner))
    }

    /// Return `true` if `owner` has a record.
    pub fn contains_owner(&self, owner: &Principal) -> bool {
        self.by_owner.contains_key(owner)
    }

    /// Return `true` if `agent` is bound to some owner.
    pub fn contains_agent(&self, agent: &Principal) -> bool {
        self.by_agent.contains_key(agent)
    }

    /// Return `true` if `identity` is bound in either role.
    pub fn is_bound(&self, identity: &Principal) -> bool {
        self.contains_owner(identity) || self.contains_agent(identity)
    }

    /// Iterate over all records in owner order.
    pub fn iter(&self) -> impl Iterator<Item = &AccountRecord> {
        self.by_owner.values()
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.by_owner.len()
    }

    /// Return `true` when the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.by_owner.is_empty()
    }
}
