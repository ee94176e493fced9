//! Pure predicates over the facts of one evaluation.
//!
//! Each predicate answers a single question; policies are built by
//! composing them with [`all`], [`any`] and [`not`].

use uuid::Uuid;

use super::action::Action;
use super::identity::IdentityContext;
use super::role::CapabilitySet;

/// Everything a predicate may look at. Owner and capabilities are resolved
/// once before any predicate runs.
#[derive(Debug, Clone, Copy)]
pub struct Facts<'a> {
    pub identity: &'a IdentityContext,
    pub action: Action,
    pub resource_type: &'a str,
    pub target_id: Option<Uuid>,
    pub owner: Option<Uuid>,
    pub capabilities: Option<&'a CapabilitySet>,
    /// The type keeps instances private to their owner, reads included.
    pub owner_only_reads: bool,
}

pub fn safe_action(facts: &Facts<'_>) -> bool {
    facts.action.is_safe()
}

pub fn creating(facts: &Facts<'_>) -> bool {
    facts.action == Action::Create
}

pub fn relationship_action(facts: &Facts<'_>) -> bool {
    facts.action.is_relationship()
}

pub fn has_target(facts: &Facts<'_>) -> bool {
    facts.target_id.is_some()
}

pub fn has_role(facts: &Facts<'_>) -> bool {
    facts.identity.role().is_some()
}

/// Owner is set and equals the acting principal. An unset owner never matches.
pub fn is_owner(facts: &Facts<'_>) -> bool {
    match (facts.owner, facts.identity.principal_id()) {
        (Some(owner), Some(principal)) => owner == principal,
        _ => false,
    }
}

pub fn is_self_target(facts: &Facts<'_>) -> bool {
    match (facts.target_id, facts.identity.principal_id()) {
        (Some(target), Some(principal)) => target == principal,
        _ => false,
    }
}

pub fn role_capable(facts: &Facts<'_>) -> bool {
    facts
        .capabilities
        .map_or(false, |caps| caps.allows(facts.action, facts.resource_type))
}

pub fn reads_restricted(facts: &Facts<'_>) -> bool {
    facts.owner_only_reads
}

pub fn all<A, B>(a: A, b: B) -> impl Fn(&Facts<'_>) -> bool
where
    A: Fn(&Facts<'_>) -> bool,
    B: Fn(&Facts<'_>) -> bool,
{
    move |facts: &Facts<'_>| a(facts) && b(facts)
}

pub fn any<A, B>(a: A, b: B) -> impl Fn(&Facts<'_>) -> bool
where
    A: Fn(&Facts<'_>) -> bool,
    B: Fn(&Facts<'_>) -> bool,
{
    move |facts: &Facts<'_>| a(facts) || b(facts)
}

pub fn not<A>(a: A) -> impl Fn(&Facts<'_>) -> bool
where
    A: Fn(&Facts<'_>) -> bool,
{
    move |facts: &Facts<'_>| !a(facts)
}
