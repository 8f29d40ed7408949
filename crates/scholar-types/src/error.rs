use serde::{Deserialize, Serialize};
use std::fmt;

/// Cross-crate failure taxonomy.
///
/// Every engine crate keeps its own `thiserror` enum with precise variants;
/// each of those errors classifies itself into one of these four kinds so
/// callers can branch on the category without matching crate-specific
/// variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Caller lacks the required role, membership or root capability.
    Authorization,
    /// Operation is invalid for the current entity state (already
    /// registered, already claimed, already submitted, wrong status).
    State,
    /// An id or address does not resolve to an existing entity.
    Reference,
    /// A value-ledger or badge-issuer call failed or was rejected.
    ExternalInteraction,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Authorization => "authorization",
            ErrorKind::State => "state",
            ErrorKind::Reference => "reference",
            ErrorKind::ExternalInteraction => "external_interaction",
        };
        write!(f, "{}", s)
    }
}
