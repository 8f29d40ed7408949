//! External value collaborators: the fungible ledger and the badge issuer.
//!
//! The governance treasury interacts with both only through the trait seams
//! defined here. The in-memory implementations back the test suite and local
//! runs; production deployments substitute their own ledger.
//!
//! Callers must treat these collaborators as adversarial: a trait object may
//! call back into the system before returning. Engines therefore finalize
//! local state before invoking anything in this crate.

pub mod badges;
pub mod ledger;

pub use badges::{BadgeIssuer, MemoryBadgeIssuer};
pub use ledger::{MemoryLedger, ValueLedger};
