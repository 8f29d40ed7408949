use crate::metrics;
use crate::types::{GovernanceConfig, Proposal, ProposalStatus};
use crate::{GovernanceError, Result};
use chrono::Utc;
use scholar_academics::TopStudentOracle;
use scholar_events::{EventBus, SystemEvent};
use scholar_registry::MembershipRegistry;
use scholar_types::{Address, LifecycleState, ProposalId, TokenAmount};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

struct ProposalBook {
    proposals: HashMap<ProposalId, Proposal>,
    next_id: ProposalId,
    donations: HashMap<ProposalId, TokenAmount>,
}

/// Funding proposal and voting engine.
///
/// Creation is gated on the oracle having a non-empty qualifying set, not on
/// the caller belonging to it; the set is snapshotted onto the proposal and
/// never refreshed. Voting counts supporting heads only and flips the
/// proposal to `Approved` the moment the threshold is reached.
pub struct ProposalEngine {
    members: Arc<MembershipRegistry>,
    oracle: Arc<dyn TopStudentOracle>,
    config: GovernanceConfig,
    book: RwLock<ProposalBook>,
    events: EventBus,
}

impl ProposalEngine {
    pub fn new(
        members: Arc<MembershipRegistry>,
        oracle: Arc<dyn TopStudentOracle>,
        config: GovernanceConfig,
        events: EventBus,
    ) -> Self {
        Self {
            members,
            oracle,
            config,
            book: RwLock::new(ProposalBook {
                proposals: HashMap::new(),
                next_id: 1,
                donations: HashMap::new(),
            }),
            events,
        }
    }

    /// Create a funding proposal. Any caller may propose as long as the
    /// qualifying-student set is non-empty at the moment of creation.
    pub async fn create_proposal(
        &self,
        caller: Address,
        description: String,
        amount_required: TokenAmount,
    ) -> Result<ProposalId> {
        let eligible = self.oracle.top_students().await;
        if eligible.is_empty() {
            return Err(GovernanceError::NoEligibleStudents);
        }

        let mut book = self.book.write().await;
        let id = book.next_id;
        book.next_id += 1;
        book.proposals.insert(
            id,
            Proposal {
                id,
                description,
                amount_required,
                proposer: caller,
                vote_count: 0,
                status: ProposalStatus::Pending,
                eligible_students: eligible.clone(),
                created_at: Utc::now(),
            },
        );
        drop(book);

        metrics::PROPOSALS_CREATED.inc();
        info!(
            proposal_id = id,
            proposer = %caller,
            amount = %amount_required,
            eligible = eligible.len(),
            "📜 Proposal created"
        );
        self.events.emit(SystemEvent::ProposalCreated {
            proposal_id: id,
            proposer: caller.to_string(),
            amount_required: amount_required.to_units(),
            eligible_students: eligible.len(),
            timestamp: Utc::now(),
        });
        Ok(id)
    }

    /// Cast a ballot on a pending proposal. Member-only. Only supporting
    /// ballots count, and nothing stops a member voting again.
    pub async fn vote_on_proposal(
        &self,
        caller: Address,
        proposal_id: ProposalId,
        support: bool,
    ) -> Result<()> {
        if !self.members.is_member(caller).await {
            return Err(GovernanceError::NotAMember(caller));
        }

        let mut book = self.book.write().await;
        let proposal = book
            .proposals
            .get_mut(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;
        if proposal.status != ProposalStatus::Pending {
            return Err(GovernanceError::InvalidStatus {
                expected: ProposalStatus::Pending,
                found: proposal.status,
            });
        }

        if support {
            proposal.vote_count += 1;
        }
        let vote_count = proposal.vote_count;

        let approved_now = vote_count >= self.config.min_votes_required
            && proposal.status.can_transition_to(&ProposalStatus::Approved);
        if approved_now {
            proposal.status = ProposalStatus::Approved;
        }
        drop(book);

        let ballot = if support { "support" } else { "dissent" };
        metrics::VOTES_CAST.with_label_values(&[ballot]).inc();
        info!(proposal_id, voter = %caller, ballot, vote_count, "🗳️ Vote recorded");

        if approved_now {
            metrics::PROPOSAL_TRANSITIONS
                .with_label_values(&["pending", "approved"])
                .inc();
            info!(proposal_id, vote_count, "✅ Proposal reached vote threshold");
            self.events.emit(SystemEvent::ProposalStatusChanged {
                proposal_id,
                old_status: ProposalStatus::Pending.as_str().to_string(),
                new_status: ProposalStatus::Approved.as_str().to_string(),
                vote_count,
                timestamp: Utc::now(),
            });
        }
        Ok(())
    }

    /// Transition an approved proposal to Closed and hand its recipient and
    /// amount to the treasury. The admin gate lives on the treasury side.
    pub(crate) async fn close_for_grant(
        &self,
        proposal_id: ProposalId,
    ) -> Result<(Address, TokenAmount)> {
        let mut book = self.book.write().await;
        let proposal = book
            .proposals
            .get_mut(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;
        if !proposal.status.can_transition_to(&ProposalStatus::Closed) {
            return Err(GovernanceError::InvalidStatus {
                expected: ProposalStatus::Approved,
                found: proposal.status,
            });
        }

        let old_status = proposal.status;
        proposal.status = ProposalStatus::Closed;
        let recipient = proposal.proposer;
        let amount = proposal.amount_required;
        let vote_count = proposal.vote_count;
        drop(book);

        metrics::PROPOSAL_TRANSITIONS
            .with_label_values(&[old_status.as_str(), "closed"])
            .inc();
        self.events.emit(SystemEvent::ProposalStatusChanged {
            proposal_id,
            old_status: old_status.as_str().to_string(),
            new_status: ProposalStatus::Closed.as_str().to_string(),
            vote_count,
            timestamp: Utc::now(),
        });
        Ok((recipient, amount))
    }

    /// Record a donation against a pending proposal. The status check and
    /// the accumulator update happen under one write guard, so a concurrent
    /// vote cannot flip the proposal between the guard and the record.
    pub(crate) async fn record_donation(
        &self,
        proposal_id: ProposalId,
        amount: TokenAmount,
    ) -> Result<()> {
        let mut book = self.book.write().await;
        let proposal = book
            .proposals
            .get(&proposal_id)
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))?;
        if proposal.status != ProposalStatus::Pending {
            return Err(GovernanceError::InvalidStatus {
                expected: ProposalStatus::Pending,
                found: proposal.status,
            });
        }

        let recorded = book
            .donations
            .entry(proposal_id)
            .or_insert(TokenAmount::ZERO);
        *recorded = recorded.saturating_add(amount);
        Ok(())
    }

    /// Undo a recorded donation whose value pull failed.
    pub(crate) async fn rollback_donation(&self, proposal_id: ProposalId, amount: TokenAmount) {
        let mut book = self.book.write().await;
        if let Some(recorded) = book.donations.get_mut(&proposal_id) {
            *recorded = recorded.saturating_sub(amount);
        }
    }

    pub async fn donations_to(&self, proposal_id: ProposalId) -> TokenAmount {
        let book = self.book.read().await;
        book.donations
            .get(&proposal_id)
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    pub async fn proposal(&self, proposal_id: ProposalId) -> Option<Proposal> {
        let book = self.book.read().await;
        book.proposals.get(&proposal_id).cloned()
    }

    pub async fn proposal_count(&self) -> u64 {
        let book = self.book.read().await;
        book.next_id - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scholar_registry::AccessController;
    use scholar_types::ErrorKind;
    use tokio::sync::RwLock as TokioRwLock;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 32])
    }

    /// Oracle stub with a mutable qualifying set.
    struct FixedOracle {
        students: TokioRwLock<Vec<Address>>,
    }

    impl FixedOracle {
        fn with(students: Vec<Address>) -> Arc<Self> {
            Arc::new(Self {
                students: TokioRwLock::new(students),
            })
        }

        async fn set(&self, students: Vec<Address>) {
            *self.students.write().await = students;
        }
    }

    #[async_trait]
    impl TopStudentOracle for FixedOracle {
        async fn top_students(&self) -> Vec<Address> {
            self.students.read().await.clone()
        }
    }

    struct Fixture {
        engine: ProposalEngine,
        oracle: Arc<FixedOracle>,
        members: Arc<MembershipRegistry>,
        admin: Address,
    }

    fn fixture(min_votes: u64, eligible: Vec<Address>) -> Fixture {
        let admin = addr(1);
        let events = EventBus::new();
        let access = Arc::new(AccessController::new(admin, events.clone()));
        let members = Arc::new(MembershipRegistry::new(access, events.clone()));
        let oracle = FixedOracle::with(eligible);
        let engine = ProposalEngine::new(
            members.clone(),
            oracle.clone(),
            GovernanceConfig {
                min_votes_required: min_votes,
            },
            events,
        );
        Fixture {
            engine,
            oracle,
            members,
            admin,
        }
    }

    #[tokio::test]
    async fn test_creation_requires_nonempty_oracle_set() {
        let f = fixture(3, vec![]);
        let err = f
            .engine
            .create_proposal(addr(10), "Lab fees".into(), TokenAmount::from_units(500))
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::NoEligibleStudents));
        assert_eq!(f.engine.proposal_count().await, 0);
    }

    #[tokio::test]
    async fn test_creation_gate_is_global_not_caller_membership() {
        // The qualifying set does not contain the caller; creation still works.
        let f = fixture(3, vec![addr(50)]);
        let id = f
            .engine
            .create_proposal(addr(10), "Lab fees".into(), TokenAmount::from_units(500))
            .await
            .unwrap();
        assert_eq!(id, 1);

        let proposal = f.engine.proposal(id).await.unwrap();
        assert_eq!(proposal.proposer, addr(10));
        assert_eq!(proposal.status, ProposalStatus::Pending);
        assert_eq!(proposal.eligible_students, vec![addr(50)]);
    }

    #[tokio::test]
    async fn test_dense_ids_and_snapshot_isolation() {
        let f = fixture(3, vec![addr(50)]);
        let first = f
            .engine
            .create_proposal(addr(10), "A".into(), TokenAmount::from_units(100))
            .await
            .unwrap();

        // Oracle set changes after creation; the first snapshot is untouched.
        f.oracle.set(vec![addr(51), addr(52)]).await;
        let second = f
            .engine
            .create_proposal(addr(11), "B".into(), TokenAmount::from_units(200))
            .await
            .unwrap();

        assert_eq!((first, second), (1, 2));
        assert_eq!(
            f.engine.proposal(first).await.unwrap().eligible_students,
            vec![addr(50)]
        );
        assert_eq!(
            f.engine.proposal(second).await.unwrap().eligible_students,
            vec![addr(51), addr(52)]
        );
    }

    #[tokio::test]
    async fn test_non_member_cannot_vote() {
        let f = fixture(3, vec![addr(50)]);
        let id = f
            .engine
            .create_proposal(addr(10), "A".into(), TokenAmount::from_units(100))
            .await
            .unwrap();

        let err = f.engine.vote_on_proposal(addr(20), id, true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(f.engine.proposal(id).await.unwrap().vote_count, 0);
    }

    #[tokio::test]
    async fn test_threshold_flips_to_approved_in_same_call() {
        let f = fixture(3, vec![addr(50)]);
        let id = f
            .engine
            .create_proposal(addr(10), "A".into(), TokenAmount::from_units(100))
            .await
            .unwrap();

        for i in 0..3u8 {
            let voter = addr(30 + i);
            f.members.add_member(f.admin, voter, 1).await.unwrap();
            f.engine.vote_on_proposal(voter, id, true).await.unwrap();
        }

        let proposal = f.engine.proposal(id).await.unwrap();
        assert_eq!(proposal.vote_count, 3);
        assert_eq!(proposal.status, ProposalStatus::Approved);
    }

    #[tokio::test]
    async fn test_dissent_uncounted_and_repeat_votes_allowed() {
        let f = fixture(3, vec![addr(50)]);
        let id = f
            .engine
            .create_proposal(addr(10), "A".into(), TokenAmount::from_units(100))
            .await
            .unwrap();

        let voter = addr(30);
        f.members.add_member(f.admin, voter, 1).await.unwrap();

        f.engine.vote_on_proposal(voter, id, false).await.unwrap();
        assert_eq!(f.engine.proposal(id).await.unwrap().vote_count, 0);

        // The same member voting three times carries the proposal alone.
        for _ in 0..3 {
            f.engine.vote_on_proposal(voter, id, true).await.unwrap();
        }
        let proposal = f.engine.proposal(id).await.unwrap();
        assert_eq!(proposal.vote_count, 3);
        assert_eq!(proposal.status, ProposalStatus::Approved);
    }

    #[tokio::test]
    async fn test_votes_rejected_once_not_pending() {
        let f = fixture(1, vec![addr(50)]);
        let id = f
            .engine
            .create_proposal(addr(10), "A".into(), TokenAmount::from_units(100))
            .await
            .unwrap();

        let voter = addr(30);
        f.members.add_member(f.admin, voter, 1).await.unwrap();
        f.engine.vote_on_proposal(voter, id, true).await.unwrap();
        assert_eq!(
            f.engine.proposal(id).await.unwrap().status,
            ProposalStatus::Approved
        );

        let err = f.engine.vote_on_proposal(voter, id, true).await.unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidStatus { .. }));
        assert_eq!(f.engine.proposal(id).await.unwrap().vote_count, 1);
    }

    #[tokio::test]
    async fn test_record_donation_pending_only() {
        let f = fixture(1, vec![addr(50)]);
        let id = f
            .engine
            .create_proposal(addr(10), "A".into(), TokenAmount::from_units(100))
            .await
            .unwrap();

        f.engine
            .record_donation(id, TokenAmount::from_units(40))
            .await
            .unwrap();
        assert_eq!(f.engine.donations_to(id).await, TokenAmount::from_units(40));

        f.engine
            .rollback_donation(id, TokenAmount::from_units(40))
            .await;
        assert_eq!(f.engine.donations_to(id).await, TokenAmount::ZERO);

        // Once the proposal leaves Pending the record is refused outright.
        let voter = addr(30);
        f.members.add_member(f.admin, voter, 1).await.unwrap();
        f.engine.vote_on_proposal(voter, id, true).await.unwrap();
        let err = f
            .engine
            .record_donation(id, TokenAmount::from_units(10))
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidStatus { .. }));
        assert_eq!(f.engine.donations_to(id).await, TokenAmount::ZERO);
    }

    #[tokio::test]
    async fn test_close_for_grant_requires_approved() {
        let f = fixture(1, vec![addr(50)]);
        let id = f
            .engine
            .create_proposal(addr(10), "A".into(), TokenAmount::from_units(100))
            .await
            .unwrap();

        // Still Pending
        let err = f.engine.close_for_grant(id).await.unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidStatus { .. }));

        let voter = addr(30);
        f.members.add_member(f.admin, voter, 1).await.unwrap();
        f.engine.vote_on_proposal(voter, id, true).await.unwrap();

        let (recipient, amount) = f.engine.close_for_grant(id).await.unwrap();
        assert_eq!(recipient, addr(10));
        assert_eq!(amount, TokenAmount::from_units(100));
        assert_eq!(
            f.engine.proposal(id).await.unwrap().status,
            ProposalStatus::Closed
        );

        // Closed is terminal
        let err = f.engine.close_for_grant(id).await.unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidStatus { .. }));
    }
}
