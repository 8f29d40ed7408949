use chrono::{DateTime, Utc};
use scholar_types::{Address, GrantId, LifecycleState, ProposalId, TokenAmount};
use serde::{Deserialize, Serialize};

/// Funding proposal lifecycle.
///
/// The live path is `Pending → Approved → Closed`. `Denied` and `Executed`
/// exist on the wire for forward compatibility; no operation currently
/// produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Pending,
    Approved,
    Closed,
    Denied,
    Executed,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Approved => "approved",
            ProposalStatus::Closed => "closed",
            ProposalStatus::Denied => "denied",
            ProposalStatus::Executed => "executed",
        }
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl LifecycleState for ProposalStatus {
    fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProposalStatus::Closed | ProposalStatus::Denied | ProposalStatus::Executed
        )
    }

    fn can_transition_to(&self, next: &Self) -> bool {
        matches!(
            (self, next),
            (ProposalStatus::Pending, ProposalStatus::Approved)
                | (ProposalStatus::Approved, ProposalStatus::Closed)
        )
    }
}

/// Funding proposal. `eligible_students` is snapshotted from the oracle at
/// creation and never refreshed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub description: String,
    pub amount_required: TokenAmount,
    pub proposer: Address,
    pub vote_count: u64,
    pub status: ProposalStatus,
    pub eligible_students: Vec<Address>,
    pub created_at: DateTime<Utc>,
}

/// Claimable grant produced when an approved proposal is closed.
/// `claimed` is a one-way latch; it is set before any external interaction
/// and never unset on success.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GrantRequest {
    pub id: GrantId,
    pub associated_student: Address,
    pub amount_requested: TokenAmount,
    pub approved: bool,
    pub claimed: bool,
    pub closed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Supporting votes at which a pending proposal flips to Approved.
    pub min_votes_required: u64,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            min_votes_required: 100,
        }
    }
}
