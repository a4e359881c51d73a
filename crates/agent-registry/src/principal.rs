//! Principals: the identities the registry binds and authorizes.
//!
//! A principal is an opaque identity string supplied by the host. The
//! registry never authenticates it; it only compares principals for
//! equality. Principals can also be derived from an Ed25519 public key.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{RegistryError, Result};

/// Maximum length of a principal string, in bytes.
pub const MAX_PRINCIPAL_LEN: usize = 256;

/// Prefix for principals derived from a public key.
const DERIVED_PREFIX: &str = "agt_";

/// An identity known to the registry (registrar, attestor, owner or agent).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Create a principal from an identity string.
    ///
    /// Rejects empty strings, strings longer than [`MAX_PRINCIPAL_LEN`], and
    /// strings containing whitespace or control characters.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(RegistryError::InvalidPrincipal(
                "principal must not be empty".into(),
            ));
        }
        if value.len() > MAX_PRINCIPAL_LEN {
            return Err(RegistryError::InvalidPrincipal(format!(
                "principal exceeds {MAX_PRINCIPAL_LEN} bytes"
            )));
        }
        if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(RegistryError::InvalidPrincipal(format!(
                "principal contains whitespace or control characters: {value:?}"
            )));
        }
        Ok(Self(value))
    }

    /// Derive a principal from a verifying (public) key.
    ///
    /// Format: `agt_` + base58 of the first 16 bytes of SHA-256(public_key).
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let hash = Sha256::digest(key.as_bytes());
        let encoded = bs58::encode(&hash[..16]).into_string();
        Self(format!("{DERIVED_PREFIX}{encoded}"))
    }

    /// Derive a principal from a base64-encoded 32-byte Ed25519 public key.
    pub fn from_public_key_base64(encoded: &str) -> Result<Self> {
        let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, encoded)
            .map_err(|e| RegistryError::InvalidKey(format!("invalid base64 public key: {e}")))?;
        let key_bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| RegistryError::InvalidKey("public key must be 32 bytes".into()))?;
        let key = VerifyingKey::from_bytes(&key_bytes)
            .map_err(|e| RegistryError::InvalidKey(e.to_string()))?;
        Ok(Self::from_verifying_key(&key))
    }

    /// Return the principal as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return `true` if this principal was derived from a public key.
    pub fn is_key_derived(&self) -> bool {
        self.0.starts_with(DERIVED_PREFIX)
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Principal {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Principal {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Principal> for String {
    fn from(p: Principal) -> Self {
        p.0
    }
}

impl AsRef<str> for Principal {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
