//! Identity and capability registries.
//!
//! Three small services gate every mutating call in the system:
//!
//! - [`AccessController`] holds the root identity and supports handover.
//! - [`RoleRegistry`] tracks student/instructor credentials as set-once
//!   monotonic flags; there is no revocation path.
//! - [`MembershipRegistry`] tracks governance members and their tier,
//!   independent of the academic roles.

pub mod access;
pub mod error;
pub mod members;
pub mod roles;

pub use access::AccessController;
pub use error::{RegistryError, Result};
pub use members::{Member, MemberTier, MembershipRegistry};
pub use roles::{InstructorRecord, RoleFlags, RoleRegistry, StudentRecord};
