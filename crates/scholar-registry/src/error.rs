use scholar_types::{Address, ErrorKind};
use thiserror::Error;

/// Registry operation result type
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Caller {0} is not the root identity")]
    NotRoot(Address),

    #[error("Address {address} is already registered as {role}")]
    AlreadyRegistered { role: &'static str, address: Address },

    #[error("Matric number {0} is already taken")]
    MatricTaken(String),

    #[error("Address {0} is not an instructor")]
    NotAnInstructor(Address),

    #[error("Instructor {0} is already verified")]
    AlreadyVerified(Address),

    #[error("Address {0} does not resolve to a registered entity")]
    UnknownAddress(Address),
}

impl RegistryError {
    /// Cross-crate failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::NotRoot(_) => ErrorKind::Authorization,
            RegistryError::AlreadyRegistered { .. } => ErrorKind::State,
            RegistryError::MatricTaken(_) => ErrorKind::State,
            RegistryError::AlreadyVerified(_) => ErrorKind::State,
            RegistryError::NotAnInstructor(_) => ErrorKind::Reference,
            RegistryError::UnknownAddress(_) => ErrorKind::Reference,
        }
    }
}
