//! Notification events for off-system indexing.
//!
//! Engines emit an event after each successful mutation — never on failure —
//! so external indexers can follow registrations, course lifecycle, exam
//! progress and the proposal/grant pipeline without polling.

use chrono::{DateTime, Utc};
use scholar_types::{BadgeId, CourseId, GrantId, ProposalId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Buffered events per channel before old events are dropped.
const HIGH_PRIORITY_BUFFER: usize = 1000;
const MEDIUM_PRIORITY_BUFFER: usize = 500;
const LOW_PRIORITY_BUFFER: usize = 100;

/// Events emitted by the scholar engines. Addresses are rendered as hex
/// strings so consumers need no domain types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SystemEvent {
    /// A student credential was registered
    StudentRegistered {
        address: String,
        matric: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// An instructor credential was registered
    InstructorRegistered {
        address: String,
        experience_years: u32,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// An instructor passed admin verification
    InstructorVerified {
        address: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// Root identity handed over
    OwnershipTransferred {
        previous_root: String,
        new_root: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// Governance member added or overwritten
    MemberAdded {
        address: String,
        tier: String,
        vote_power: u64,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// New course registered by an instructor
    CourseRegistered {
        course_id: CourseId,
        name: String,
        instructor: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// Course approved by admin
    CourseApproved {
        course_id: CourseId,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// Student enrolled in an approved course
    StudentEnrolled {
        course_id: CourseId,
        student: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// Exam requested by an enrolled student
    ExamStarted {
        course_id: CourseId,
        student: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// Exam request approved by the course instructor
    ExamApproved {
        course_id: CourseId,
        student: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// Exam result submitted for a student
    ResultSubmitted {
        student: String,
        score: u32,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// Existing score overwritten by a verified instructor
    ScoreUpdated {
        student: String,
        score: u32,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// Student disputed their submitted score
    ScoreDisputed {
        student: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// Score verification attested by a verified instructor
    ScoreVerified {
        student: String,
        verifier: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// Score submissions paused process-wide
    SubmissionsPaused {
        by: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// Score submissions resumed
    SubmissionsResumed {
        by: String,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// Funding proposal created
    ProposalCreated {
        proposal_id: ProposalId,
        proposer: String,
        amount_required: u64,
        eligible_students: usize,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// Proposal status changed (including vote-threshold approval)
    ProposalStatusChanged {
        proposal_id: ProposalId,
        old_status: String,
        new_status: String,
        vote_count: u64,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// Proposal closed by admin and turned into a claimable grant
    ProposalClosed {
        proposal_id: ProposalId,
        grant_id: GrantId,
        recipient: String,
        amount: u64,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// Grant disbursed exactly once to its recipient
    GrantClaimed {
        grant_id: GrantId,
        recipient: String,
        amount: u64,
        badge_id: BadgeId,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// Donation pulled into the treasury against a pending proposal
    DonationReceived {
        proposal_id: ProposalId,
        donor: String,
        amount: u64,
        badge_id: BadgeId,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },
}

impl SystemEvent {
    /// Event name for external consumers.
    pub fn event_type(&self) -> &'static str {
        match self {
            SystemEvent::StudentRegistered { .. } => "registry.student.registered",
            SystemEvent::InstructorRegistered { .. } => "registry.instructor.registered",
            SystemEvent::InstructorVerified { .. } => "registry.instructor.verified",
            SystemEvent::OwnershipTransferred { .. } => "registry.ownership.transferred",
            SystemEvent::MemberAdded { .. } => "registry.member.added",
            SystemEvent::CourseRegistered { .. } => "academics.course.registered",
            SystemEvent::CourseApproved { .. } => "academics.course.approved",
            SystemEvent::StudentEnrolled { .. } => "academics.enrollment.added",
            SystemEvent::ExamStarted { .. } => "academics.exam.started",
            SystemEvent::ExamApproved { .. } => "academics.exam.approved",
            SystemEvent::ResultSubmitted { .. } => "academics.result.submitted",
            SystemEvent::ScoreUpdated { .. } => "academics.score.updated",
            SystemEvent::ScoreDisputed { .. } => "academics.score.disputed",
            SystemEvent::ScoreVerified { .. } => "academics.score.verified",
            SystemEvent::SubmissionsPaused { .. } => "academics.submissions.paused",
            SystemEvent::SubmissionsResumed { .. } => "academics.submissions.resumed",
            SystemEvent::ProposalCreated { .. } => "governance.proposal.created",
            SystemEvent::ProposalStatusChanged { .. } => "governance.proposal.status",
            SystemEvent::ProposalClosed { .. } => "governance.proposal.closed",
            SystemEvent::GrantClaimed { .. } => "governance.grant.claimed",
            SystemEvent::DonationReceived { .. } => "governance.donation.received",
        }
    }

    /// Routing priority for the bus.
    pub fn priority(&self) -> EventPriority {
        match self {
            // High priority: value movement and governance decisions
            SystemEvent::GrantClaimed { .. } => EventPriority::High,
            SystemEvent::DonationReceived { .. } => EventPriority::High,
            SystemEvent::ProposalCreated { .. } => EventPriority::High,
            SystemEvent::ProposalStatusChanged { .. } => EventPriority::High,
            SystemEvent::ProposalClosed { .. } => EventPriority::High,
            SystemEvent::OwnershipTransferred { .. } => EventPriority::High,

            // Medium priority: exam pipeline progress
            SystemEvent::ExamStarted { .. } => EventPriority::Medium,
            SystemEvent::ExamApproved { .. } => EventPriority::Medium,
            SystemEvent::ResultSubmitted { .. } => EventPriority::Medium,
            SystemEvent::ScoreUpdated { .. } => EventPriority::Medium,
            SystemEvent::ScoreDisputed { .. } => EventPriority::Medium,
            SystemEvent::ScoreVerified { .. } => EventPriority::Medium,
            SystemEvent::SubmissionsPaused { .. } => EventPriority::Medium,
            SystemEvent::SubmissionsResumed { .. } => EventPriority::Medium,

            // Low priority: infrequent registrations
            SystemEvent::StudentRegistered { .. } => EventPriority::Low,
            SystemEvent::InstructorRegistered { .. } => EventPriority::Low,
            SystemEvent::InstructorVerified { .. } => EventPriority::Low,
            SystemEvent::MemberAdded { .. } => EventPriority::Low,
            SystemEvent::CourseRegistered { .. } => EventPriority::Low,
            SystemEvent::CourseApproved { .. } => EventPriority::Low,
            SystemEvent::StudentEnrolled { .. } => EventPriority::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventPriority {
    High,
    Medium,
    Low,
}

/// Event bus broadcasting state changes to subscribers.
///
/// Three priority channels keep value-movement events flowing with minimal
/// latency even when exam-pipeline chatter is heavy.
#[derive(Clone)]
pub struct EventBus {
    high_priority: broadcast::Sender<SystemEvent>,
    medium_priority: broadcast::Sender<SystemEvent>,
    low_priority: broadcast::Sender<SystemEvent>,
    emitted: Arc<std::sync::atomic::AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        let (high_tx, _) = broadcast::channel(HIGH_PRIORITY_BUFFER);
        let (medium_tx, _) = broadcast::channel(MEDIUM_PRIORITY_BUFFER);
        let (low_tx, _) = broadcast::channel(LOW_PRIORITY_BUFFER);

        Self {
            high_priority: high_tx,
            medium_priority: medium_tx,
            low_priority: low_tx,
            emitted: Arc::new(std::sync::atomic::AtomicU64::new(0)),
        }
    }

    /// Subscribe to all channels. Returns (high, medium, low) receivers.
    pub fn subscribe_all(
        &self,
    ) -> (
        broadcast::Receiver<SystemEvent>,
        broadcast::Receiver<SystemEvent>,
        broadcast::Receiver<SystemEvent>,
    ) {
        (
            self.high_priority.subscribe(),
            self.medium_priority.subscribe(),
            self.low_priority.subscribe(),
        )
    }

    pub fn subscribe_high_priority(&self) -> broadcast::Receiver<SystemEvent> {
        self.high_priority.subscribe()
    }

    /// Emit an event to the channel matching its priority.
    ///
    /// An event with no subscribers is dropped; that is expected, not an
    /// error.
    pub fn emit(&self, event: SystemEvent) {
        let channel = match event.priority() {
            EventPriority::High => &self.high_priority,
            EventPriority::Medium => &self.medium_priority,
            EventPriority::Low => &self.low_priority,
        };

        match channel.send(event.clone()) {
            Ok(subscriber_count) => {
                debug!(
                    event_type = event.event_type(),
                    subscribers = subscriber_count,
                    "Event emitted"
                );
                self.emitted
                    .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            }
            Err(_) => {
                debug!(
                    event_type = event.event_type(),
                    "Event emitted but no subscribers listening"
                );
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.high_priority.receiver_count()
            + self.medium_priority.receiver_count()
            + self.low_priority.receiver_count()
    }

    pub fn total_events_emitted(&self) -> u64 {
        self.emitted.load(std::sync::atomic::Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
