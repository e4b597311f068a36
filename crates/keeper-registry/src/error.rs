//! Registry error types.

use thiserror::Error;

/// Errors returned by the public registry operations.
///
/// Each failure maps to exactly one [`ErrorKind`].
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("service id already registered: {0}")]
    DuplicateName(String),

    #[error("service id not registered: {0}")]
    EntityNotFound(String),

    #[error("state store error: {0}")]
    Persistence(#[from] keeper_state::StateError),
}

/// Flat classification of [`RegistryError`] for transport mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    DuplicateName,
    EntityNotFound,
    PersistenceError,
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::InvalidInput(_) => ErrorKind::InvalidInput,
            RegistryError::DuplicateName(_) => ErrorKind::DuplicateName,
            RegistryError::EntityNotFound(_) => ErrorKind::EntityNotFound,
            RegistryError::Persistence(_) => ErrorKind::PersistenceError,
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
