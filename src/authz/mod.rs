//! Authorization module - role and ownership policy evaluation
//!
//! This module decides, per request, whether an actor may perform an action
//! on a resource. It combines three signals:
//! - authentication state
//! - the principal's role and its capabilities
//! - ownership of the target resource
//!
//! Everything here is pure and read-only after startup; the only I/O is the
//! single target lookup performed by [`Gate::authorize`].

mod action;
mod decision;
mod error;
mod evaluator;
mod identity;
mod ownership;
mod policy;
pub mod predicate;
mod role;

pub use action::{Action, ActionCatalog, UnknownAction};
pub use decision::{Decision, DenyReason};
pub use error::{ConfigError, ConfigResult};
pub use evaluator::{Authorized, Gate, ResourceLookup};
pub use identity::IdentityContext;
pub use ownership::{OwnershipResolver, PolicyResource, PrincipalFields};
pub use policy::{PolicyFamily, PolicyTable, ResourcePolicy};
pub use role::{Capability, CapabilitySet, Role, RoleRegistry};

/// Well-known role names
pub mod roles {
    pub const ADMIN: &str = "Admin";
    pub const HR_STAFF: &str = "HR Staff";
    pub const CUSTOMIZED: &str = "Customized";
    pub const LIBRARIAN: &str = "Librarian";
    pub const MEMBER: &str = "Member";
}

/// Well-known resource type names
pub mod resources {
    pub const POST: &str = "post";
    pub const COMMENT: &str = "comment";
    pub const USER: &str = "user";
    pub const ROLE_ASSIGNMENT: &str = "role_assignment";
    pub const EMPLOYEE: &str = "employee";
    pub const DEPARTMENT: &str = "department";
    pub const BOOK: &str = "book";
    pub const NOTIFICATION: &str = "notification";
}
