//! Account records and the read-only snapshots derived from them.

use std::collections::BTreeSet;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::config::{attestor_slot_name, RegistryConfig, REGISTRAR_SLOT};
use crate::principal::Principal;

// ---------------------------------------------------------------------------
// Account Record
// ---------------------------------------------------------------------------

/// One owner-to-agent binding and the attestations it has collected.
///
/// The registrar's attestation is implicit, so a fresh record starts at
/// level 1 with an empty `signed_by` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub owner: Principal,
    pub agent: Principal,
    pub attestation_level: u32,
    pub signed_by: BTreeSet<Principal>,
    /// Creation timestamp (microseconds since Unix epoch).
    pub registered_at: u64,
}

impl AccountRecord {
    /// Create a freshly registered record at level 1.
    pub fn new(owner: Principal, agent: Principal) -> Self {
        Self {
            owner,
            agent,
            attestation_level: 1,
            signed_by: BTreeSet::new(),
            registered_at: crate::time::now_micros(),
        }
    }

    /// Record a signature from `attestor` and return the new level.
    ///
    /// Returns `None` without changing anything if `attestor` already signed.
    pub(crate) fn add_signature(&mut self, attestor: Principal) -> Option<u32> {
        if !self.signed_by.insert(attestor) {
            return None;
        }
        self.attestation_level += 1;
        Some(self.attestation_level)
    }

    /// Return `true` if `attestor` has signed this record.
    pub fn has_signed(&self, attestor: &Principal) -> bool {
        self.signed_by.contains(attestor)
    }

    /// The `{owner, agent, attestation_level}` view of this record.
    pub fn info(&self) -> AccountInfo {
        AccountInfo {
            owner: self.owner.clone(),
            agent: self.agent.clone(),
            attestation_level: self.attestation_level,
        }
    }

    /// Check the record against `config`, returning a description of the
    /// first broken invariant.
    pub(crate) fn check(&self, config: &RegistryConfig) -> std::result::Result<(), String> {
        if self.owner == self.agent {
            return Err(format!("owner {} is bound to itself", self.owner));
        }
        if let Some(stranger) = self.signed_by.iter().find(|s| !config.is_attestor(s)) {
            return Err(format!(
                "account {} signed by non-attestor {stranger}",
                self.owner
            ));
        }
        let expected = 1 + self.signed_by.len() as u32;
        if self.attestation_level != expected {
            return Err(format!(
                "account {} has level {} but {} signature(s)",
                self.owner,
                self.attestation_level,
                self.signed_by.len()
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Account Info
// ---------------------------------------------------------------------------

/// Snapshot returned by account-info queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub owner: Principal,
    pub agent: Principal,
    pub attestation_level: u32,
}

// ---------------------------------------------------------------------------
// Account Attestors
// ---------------------------------------------------------------------------

/// Signature status of one configured attestor for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestorStatus {
    /// 1-based position in the configuration.
    pub position: usize,
    pub attestor: Principal,
    pub signed: bool,
}

impl AttestorStatus {
    /// Positional field name, e.g. `attestor-1`.
    pub fn slot_name(&self) -> String {
        attestor_slot_name(self.position)
    }
}

/// Per-attestor signature flags for one account.
///
/// Has one entry per configured attestor, in configuration order, plus the
/// registrar's slot, which is always signed once the account exists.
/// Serializes as an object keyed by slot name:
///
/// ```json
/// { "attestor-registrar": true, "attestor-1": true, "attestor-2": false }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountAttestors {
    pub registrar: bool,
    pub attestors: Vec<AttestorStatus>,
}

impl AccountAttestors {
    /// Build the flags for `record` by walking the configured attestors.
    pub fn for_record(config: &RegistryConfig, record: &AccountRecord) -> Self {
        let attestors = config
            .attestors()
            .iter()
            .enumerate()
            .map(|(i, attestor)| AttestorStatus {
                position: i + 1,
                attestor: attestor.clone(),
                signed: record.has_signed(attestor),
            })
            .collect();

        Self {
            registrar: true,
            attestors,
        }
    }

    /// Status of the attestor at 1-based `position`.
    pub fn get(&self, position: usize) -> Option<&AttestorStatus> {
        position.checked_sub(1).and_then(|i| self.attestors.get(i))
    }

    /// `(slot name, signed)` pairs, registrar first.
    pub fn fields(&self) -> Vec<(String, bool)> {
        std::iter::once((REGISTRAR_SLOT.to_string(), self.registrar))
            .chain(self.attestors.iter().map(|s| (s.slot_name(), s.signed)))
            .collect()
    }

    /// Return `true` once every configured attestor has signed.
    pub fn all_signed(&self) -> bool {
        self.registrar && self.attestors.iter().all(|s| s.signed)
    }
}

impl Serialize for AccountAttestors {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attestors.len() + 1))?;
        map.serialize_entry(REGISTRAR_SLOT, &self.registrar)?;
        for status in &self.attestors {
            map.serialize_entry(&status.slot_name(), &status.signed)?;
        }
        map.end()
    }
}
