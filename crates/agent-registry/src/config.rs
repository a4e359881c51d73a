//! Registry configuration: the registrar and the fixed attestor set.
//!
//! The configuration is supplied once, before any operation runs, and is
//! never mutated afterwards. Rotating attestors means building a new
//! configuration, not editing this one.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};
use crate::principal::Principal;

/// Positional name of the registrar's slot in per-attestor results.
pub const REGISTRAR_SLOT: &str = "attestor-registrar";

/// Positional name of the attestor at 1-based `position`.
pub fn attestor_slot_name(position: usize) -> String {
    format!("attestor-{position}")
}

/// Immutable registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConfig")]
pub struct RegistryConfig {
    registrar: Principal,
    attestors: Vec<Principal>,
    max_attestation_level: u32,
}

/// Unvalidated shape read from JSON.
#[derive(Deserialize)]
struct RawConfig {
    registrar: Principal,
    #[serde(default)]
    attestors: Vec<Principal>,
    #[serde(default)]
    max_attestation_level: Option<u32>,
}

impl TryFrom<RawConfig> for RegistryConfig {
    type Error = RegistryError;

    fn try_from(raw: RawConfig) -> Result<Self> {
        let config = Self::new(raw.registrar, raw.attestors)?;
        if let Some(declared) = raw.max_attestation_level {
            if declared != config.max_attestation_level {
                return Err(RegistryError::InvalidConfig(format!(
                    "max_attestation_level {declared} does not match {} attestor(s)",
                    config.attestors.len()
                )));
            }
        }
        Ok(config)
    }
}

impl RegistryConfig {
    /// Build a configuration from the registrar and the ordered attestor list.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidConfig` if an attestor is listed twice
    /// or the registrar is also listed as an attestor.
    pub fn new(registrar: Principal, attestors: Vec<Principal>) -> Result<Self> {
        for (i, attestor) in attestors.iter().enumerate() {
            if *attestor == registrar {
                return Err(RegistryError::InvalidConfig(format!(
                    "registrar {registrar} cannot also be an attestor"
                )));
            }
            if attestors[..i].contains(attestor) {
                return Err(RegistryError::InvalidConfig(format!(
                    "duplicate attestor: {attestor}"
                )));
            }
        }

        let max_attestation_level = u32::try_from(attestors.len())
            .ok()
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| RegistryError::InvalidConfig("too many attestors".into()))?;

        Ok(Self {
            registrar,
            attestors,
            max_attestation_level,
        })
    }

    /// Load a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Io` if the file cannot be read, or
    /// `RegistryError::InvalidConfig` if it does not describe a valid
    /// configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            RegistryError::InvalidConfig(format!(
                "failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    /// The identity allowed to create registrations.
    pub fn registrar(&self) -> &Principal {
        &self.registrar
    }

    /// The attestors, in configuration order.
    pub fn attestors(&self) -> &[Principal] {
        &self.attestors
    }

    /// `1 + number of attestors`.
    pub fn max_attestation_level(&self) -> u32 {
        self.max_attestation_level
    }

    /// Return `true` if `identity` is a configured attestor.
    pub fn is_attestor(&self, identity: &Principal) -> bool {
        self.attestors.contains(identity)
    }

    /// Return `true` if `identity` is the registrar.
    pub fn is_registrar(&self, identity: &Principal) -> bool {
        self.registrar == *identity
    }

    /// 1-based position of `attestor` in the configuration, if configured.
    pub fn attestor_position(&self, attestor: &Principal) -> Option<usize> {
        self.attestors
            .iter()
            .position(|a| a == attestor)
            .map(|i| i + 1)
    }
}
