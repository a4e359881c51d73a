//! Error types for the agent registry.
//!
//! Every rejected operation surfaces immediately as a typed error and
//! leaves the registry untouched. Queries never error.

use crate::principal::Principal;

/// Registry error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Caller is not the registrar: {0}")]
    NotAuthorizedRegistrar(Principal),

    #[error("Already registered")]
    AlreadyRegistered,

    #[error("Caller is not an attestor: {0}")]
    NotAttestor(Principal),

    #[error("Invalid registry configuration: {0}")]
    InvalidConfig(String),

    #[error("Account not found for owner: {0}")]
    AccountNotFound(Principal),

    #[error("Owner and agent must be distinct identities: {0}")]
    InvalidBinding(Principal),

    #[error("Invalid principal: {0}")]
    InvalidPrincipal(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    /// Stable numeric code for this error.
    ///
    /// Codes 802..=806 keep the values external clients already match on.
    pub fn code(&self) -> u32 {
        match self {
            Self::NotAuthorizedRegistrar(_) => 802,
            Self::AlreadyRegistered => 803,
            Self::NotAttestor(_) => 804,
            Self::InvalidConfig(_) => 805,
            Self::AccountNotFound(_) => 806,
            Self::InvalidBinding(_) => 807,
            Self::InvalidPrincipal(_) => 808,
            Self::InvalidKey(_) => 901,
            Self::SerializationError(_) => 902,
            Self::InvalidFileFormat(_) => 903,
            Self::Io(_) => 904,
        }
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, RegistryError>;
