//! Prometheus metrics for the governance module
//!
//! Tracks proposal lifecycle, voting patterns and treasury operations.

use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec,
};

/// Proposals created
pub static PROPOSALS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "scholar_governance_proposals_created_total",
        "Total funding proposals created"
    )
    .unwrap()
});

/// Votes cast by ballot
pub static VOTES_CAST: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "scholar_governance_votes_cast_total",
        "Total votes cast",
        &["ballot"]
    )
    .unwrap()
});

/// Proposal lifecycle transitions
pub static PROPOSAL_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "scholar_governance_proposal_transitions_total",
        "Total proposal lifecycle transitions",
        &["from_status", "to_status"]
    )
    .unwrap()
});

/// Grants disbursed
pub static GRANTS_CLAIMED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "scholar_governance_grants_claimed_total",
        "Total grants disbursed"
    )
    .unwrap()
});

/// Value disbursed through grants, in units
pub static CLAIM_VALUE_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "scholar_governance_claim_value_units_total",
        "Total value disbursed through grant claims"
    )
    .unwrap()
});

/// Donations pulled into the treasury
pub static DONATIONS_RECEIVED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "scholar_governance_donations_received_total",
        "Total donations received against pending proposals"
    )
    .unwrap()
});

/// Treasury operations by kind
pub static TREASURY_OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "scholar_governance_treasury_operations_total",
        "Total treasury operations",
        &["operation"]
    )
    .unwrap()
});
