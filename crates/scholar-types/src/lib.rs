//! Shared primitive types for the scholar system.
//!
//! Everything here is deliberately small: addresses, token amounts, id
//! aliases, the cross-crate error taxonomy and the lifecycle trait that
//! status enums implement. Domain logic lives in the engine crates.

pub mod address;
pub mod amount;
pub mod error;
pub mod lifecycle;

pub use address::{Address, ContentRef};
pub use amount::TokenAmount;
pub use error::ErrorKind;
pub use lifecycle::LifecycleState;

/// Dense course identifier, allocated from 1 in registration order.
pub type CourseId = u64;

/// Dense proposal identifier, allocated from 1 in creation order.
pub type ProposalId = u64;

/// Dense grant identifier, allocated from 1 in approval order.
pub type GrantId = u64;

/// Badge token identifier, allocated by the treasury.
pub type BadgeId = u64;
