use crate::metrics;
use crate::proposals::ProposalEngine;
use crate::types::GrantRequest;
use crate::{GovernanceError, Result};
use chrono::Utc;
use scholar_academics::TopStudentOracle;
use scholar_economics::{BadgeIssuer, ValueLedger};
use scholar_events::{EventBus, SystemEvent};
use scholar_registry::AccessController;
use scholar_types::{Address, BadgeId, GrantId, ProposalId, TokenAmount};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

struct TreasuryBook {
    grants: HashMap<GrantId, GrantRequest>,
    next_grant_id: GrantId,
    next_badge_id: BadgeId,
    total_claimed: TokenAmount,
    in_flight: HashSet<GrantId>,
}

/// Grant treasury: converts closed proposals into claimable grants and is the
/// only component that touches the ledger and badge issuer.
///
/// Collaborators are adversarial. Every disbursing operation latches its
/// local state under one write guard, releases the guard, and only then calls
/// out; a re-entrant call lands on the latch (or the per-grant in-flight
/// mark) and fails with a state error. External failure compensates the
/// latched state so the operation stays retryable.
pub struct GrantTreasury {
    access: Arc<AccessController>,
    proposals: Arc<ProposalEngine>,
    oracle: Arc<dyn TopStudentOracle>,
    ledger: Arc<dyn ValueLedger>,
    badges: Arc<dyn BadgeIssuer>,
    book: RwLock<TreasuryBook>,
    events: EventBus,
}

impl GrantTreasury {
    pub fn new(
        access: Arc<AccessController>,
        proposals: Arc<ProposalEngine>,
        oracle: Arc<dyn TopStudentOracle>,
        ledger: Arc<dyn ValueLedger>,
        badges: Arc<dyn BadgeIssuer>,
        events: EventBus,
    ) -> Self {
        Self {
            access,
            proposals,
            oracle,
            ledger,
            badges,
            book: RwLock::new(TreasuryBook {
                grants: HashMap::new(),
                next_grant_id: 1,
                next_badge_id: 1,
                total_claimed: TokenAmount::ZERO,
                in_flight: HashSet::new(),
            }),
            events,
        }
    }

    /// Close an approved proposal into a claimable grant. Admin-gated. The
    /// grant binds to the proposal's recorded proposer.
    pub async fn approve_proposal(
        &self,
        caller: Address,
        proposal_id: ProposalId,
    ) -> Result<GrantId> {
        self.access.require_root(caller).await?;

        let (recipient, amount) = self.proposals.close_for_grant(proposal_id).await?;

        let mut book = self.book.write().await;
        let grant_id = book.next_grant_id;
        book.next_grant_id += 1;
        book.grants.insert(
            grant_id,
            GrantRequest {
                id: grant_id,
                associated_student: recipient,
                amount_requested: amount,
                approved: true,
                claimed: false,
                closed: true,
            },
        );
        drop(book);

        metrics::TREASURY_OPERATIONS
            .with_label_values(&["approve"])
            .inc();
        info!(
            proposal_id,
            grant_id,
            recipient = %recipient,
            amount = %amount,
            "🎓 Proposal closed into grant"
        );
        self.events.emit(SystemEvent::ProposalClosed {
            proposal_id,
            grant_id,
            recipient: recipient.to_string(),
            amount: amount.to_units(),
            timestamp: Utc::now(),
        });
        Ok(grant_id)
    }

    /// Disburse a grant to its recipient, exactly once.
    ///
    /// The claim latch, the disbursement accumulator, the badge id and the
    /// in-flight mark are all written before the ledger or the badge issuer
    /// run. A collaborator that re-enters `claim_grant` therefore fails on
    /// the latch. Ledger failure compensates everything; badge failure after
    /// a successful transfer refunds the transfer first.
    pub async fn claim_grant(&self, caller: Address, grant_id: GrantId) -> Result<BadgeId> {
        if self.oracle.top_students().await.is_empty() {
            return Err(GovernanceError::NoEligibleStudents);
        }

        // Checks and local effects under one guard
        let mut book = self.book.write().await;
        if book.in_flight.contains(&grant_id) {
            return Err(GovernanceError::ClaimInFlight(grant_id));
        }
        let grant = book
            .grants
            .get_mut(&grant_id)
            .ok_or(GovernanceError::GrantNotFound(grant_id))?;
        if !grant.approved {
            return Err(GovernanceError::GrantNotApproved(grant_id));
        }
        if grant.claimed {
            return Err(GovernanceError::AlreadyClaimed(grant_id));
        }
        if grant.associated_student != caller {
            return Err(GovernanceError::NotGrantRecipient { grant_id, caller });
        }

        let amount = grant.amount_requested;
        grant.claimed = true;
        let badge_id = book.next_badge_id;
        book.next_badge_id += 1;
        book.total_claimed = book.total_claimed.saturating_add(amount);
        book.in_flight.insert(grant_id);
        drop(book);

        // Interactions, outside any lock
        if let Err(e) = self.ledger.transfer(Address::treasury(), caller, amount).await {
            warn!(grant_id, error = %e, "Grant transfer failed, compensating");
            self.compensate_claim(grant_id, amount).await;
            return Err(GovernanceError::ExternalInteraction(format!(
                "grant transfer failed: {e}"
            )));
        }

        if let Err(e) = self.badges.mint(caller, badge_id).await {
            warn!(grant_id, badge_id, error = %e, "Badge mint failed, refunding transfer");
            match self.ledger.transfer(caller, Address::treasury(), amount).await {
                Ok(()) => {
                    self.compensate_claim(grant_id, amount).await;
                    return Err(GovernanceError::ExternalInteraction(format!(
                        "badge mint failed: {e}"
                    )));
                }
                Err(refund_err) => {
                    // Value left the treasury and cannot come back; the claim
                    // stays latched so it cannot disburse twice.
                    error!(
                        grant_id,
                        mint_error = %e,
                        refund_error = %refund_err,
                        "Badge mint and refund both failed; claim stays latched"
                    );
                    let mut book = self.book.write().await;
                    book.in_flight.remove(&grant_id);
                    drop(book);
                    return Err(GovernanceError::ExternalInteraction(format!(
                        "badge mint failed and refund failed: {e}; {refund_err}"
                    )));
                }
            }
        }

        let mut book = self.book.write().await;
        book.in_flight.remove(&grant_id);
        drop(book);

        metrics::GRANTS_CLAIMED.inc();
        metrics::CLAIM_VALUE_TOTAL.inc_by(amount.to_units());
        metrics::TREASURY_OPERATIONS
            .with_label_values(&["claim"])
            .inc();
        info!(
            grant_id,
            recipient = %caller,
            amount = %amount,
            badge_id,
            "💸 Grant disbursed"
        );
        self.events.emit(SystemEvent::GrantClaimed {
            grant_id,
            recipient: caller.to_string(),
            amount: amount.to_units(),
            badge_id,
            timestamp: Utc::now(),
        });
        Ok(badge_id)
    }

    /// Roll back the local effects of a failed claim. The badge id counter is
    /// not rewound; gaps in badge ids are harmless.
    async fn compensate_claim(&self, grant_id: GrantId, amount: TokenAmount) {
        let mut book = self.book.write().await;
        if let Some(grant) = book.grants.get_mut(&grant_id) {
            grant.claimed = false;
        }
        book.total_claimed = book.total_claimed.saturating_sub(amount);
        book.in_flight.remove(&grant_id);
    }

    /// Pull a donation from any caller against a pending proposal and mint an
    /// acknowledgment badge.
    ///
    /// The pending check and the donation record are one critical section on
    /// the proposal book; a vote that flips the proposal mid-call cannot slip
    /// a donation past the guard.
    pub async fn donate_to_proposal(
        &self,
        caller: Address,
        proposal_id: ProposalId,
        amount: TokenAmount,
    ) -> Result<BadgeId> {
        self.proposals.record_donation(proposal_id, amount).await?;

        let mut book = self.book.write().await;
        let badge_id = book.next_badge_id;
        book.next_badge_id += 1;
        drop(book);

        if let Err(e) = self
            .ledger
            .transfer_from(caller, Address::treasury(), amount)
            .await
        {
            warn!(proposal_id, donor = %caller, error = %e, "Donation pull failed, compensating");
            self.proposals.rollback_donation(proposal_id, amount).await;
            return Err(GovernanceError::ExternalInteraction(format!(
                "donation transfer failed: {e}"
            )));
        }

        if let Err(e) = self.badges.mint(caller, badge_id).await {
            warn!(proposal_id, badge_id, error = %e, "Donor badge mint failed, refunding");
            match self.ledger.transfer(Address::treasury(), caller, amount).await {
                Ok(()) => {
                    self.proposals.rollback_donation(proposal_id, amount).await;
                    return Err(GovernanceError::ExternalInteraction(format!(
                        "donor badge mint failed: {e}"
                    )));
                }
                Err(refund_err) => {
                    error!(
                        proposal_id,
                        mint_error = %e,
                        refund_error = %refund_err,
                        "Donor badge mint and refund both failed; donation stays recorded"
                    );
                    return Err(GovernanceError::ExternalInteraction(format!(
                        "donor badge mint failed and refund failed: {e}; {refund_err}"
                    )));
                }
            }
        }

        metrics::DONATIONS_RECEIVED.inc();
        metrics::TREASURY_OPERATIONS
            .with_label_values(&["donate"])
            .inc();
        info!(
            proposal_id,
            donor = %caller,
            amount = %amount,
            badge_id,
            "💰 Donation received"
        );
        self.events.emit(SystemEvent::DonationReceived {
            proposal_id,
            donor: caller.to_string(),
            amount: amount.to_units(),
            badge_id,
            timestamp: Utc::now(),
        });
        Ok(badge_id)
    }

    // Read surface

    pub async fn grant(&self, grant_id: GrantId) -> Option<GrantRequest> {
        let book = self.book.read().await;
        book.grants.get(&grant_id).copied()
    }

    pub async fn total_grants_claimed(&self) -> TokenAmount {
        let book = self.book.read().await;
        book.total_claimed
    }

    pub async fn donations_to(&self, proposal_id: ProposalId) -> TokenAmount {
        self.proposals.donations_to(proposal_id).await
    }
}
