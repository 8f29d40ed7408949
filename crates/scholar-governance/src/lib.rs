/*!
# Proposal, Voting & Grant Treasury

Governance half of the system:

- [`ProposalEngine`] — funding proposals with a snapshot of the eligible
  student set, member head-count voting, and the vote-threshold transition to
  `Approved`;
- [`GrantTreasury`] — admin conversion of approved proposals into claimable
  grants, exactly-once disbursement with an acknowledgment badge, and open
  donations against pending proposals.

The treasury is the only place the system touches external value: the ledger
and badge issuer are adversarial trait objects, called only after local state
is latched, and every claim is additionally guarded by a per-grant in-flight
lock so a re-entrant collaborator cannot double-disburse.
*/

pub mod error;
pub mod metrics;
pub mod proposals;
pub mod treasury;
pub mod types;

pub use error::{GovernanceError, Result};
pub use proposals::ProposalEngine;
pub use treasury::GrantTreasury;
pub use types::{GovernanceConfig, GrantRequest, Proposal, ProposalStatus};
