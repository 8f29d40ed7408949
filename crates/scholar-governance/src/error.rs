use crate::types::ProposalStatus;
use scholar_registry::RegistryError;
use scholar_types::{Address, ErrorKind, GrantId, ProposalId};
use thiserror::Error;

/// Governance operation result type
pub type Result<T> = std::result::Result<T, GovernanceError>;

/// Proposal, voting and treasury errors
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("Caller {0} is not a governance member")]
    NotAMember(Address),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    #[error("Grant not found: {0}")]
    GrantNotFound(GrantId),

    #[error("Proposal is {found}, expected {expected}")]
    InvalidStatus {
        expected: ProposalStatus,
        found: ProposalStatus,
    },

    #[error("No eligible students in the oracle set")]
    NoEligibleStudents,

    #[error("Grant {0} is not approved")]
    GrantNotApproved(GrantId),

    #[error("Grant {0} has already been claimed")]
    AlreadyClaimed(GrantId),

    #[error("Grant {0} has a claim in flight")]
    ClaimInFlight(GrantId),

    #[error("Caller {caller} is not the recipient of grant {grant_id}")]
    NotGrantRecipient { grant_id: GrantId, caller: Address },

    #[error("External interaction failed: {0}")]
    ExternalInteraction(String),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl GovernanceError {
    /// Cross-crate failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GovernanceError::NotAMember(_) | GovernanceError::NotGrantRecipient { .. } => {
                ErrorKind::Authorization
            }
            GovernanceError::ProposalNotFound(_) | GovernanceError::GrantNotFound(_) => {
                ErrorKind::Reference
            }
            GovernanceError::InvalidStatus { .. }
            | GovernanceError::NoEligibleStudents
            | GovernanceError::GrantNotApproved(_)
            | GovernanceError::AlreadyClaimed(_)
            | GovernanceError::ClaimInFlight(_) => ErrorKind::State,
            GovernanceError::ExternalInteraction(_) => ErrorKind::ExternalInteraction,
            GovernanceError::Registry(inner) => inner.kind(),
        }
    }
}
