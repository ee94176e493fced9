use async_trait::async_trait;
use uuid::Uuid;

use super::action::{Action, ActionCatalog};
use super::decision::{Decision, DenyReason};
use super::error::ConfigResult;
use super::identity::IdentityContext;
use super::ownership::PolicyResource;
use super::policy::{PolicyFamily, PolicyTable, ResourcePolicy};
use super::predicate::{self, all, any, not, Facts};
use super::role::{CapabilitySet, RoleRegistry};

/// Loads the target of a request from the persistence layer.
///
/// Called at most once per authorization; the loaded value is handed back
/// to the caller inside [`Authorized`].
#[async_trait]
pub trait ResourceLookup<R>: Send + Sync {
    type Error: Send;

    async fn fetch(&self, id: Uuid) -> Result<Option<R>, Self::Error>;
}

/// A decision together with the resource it was made against.
#[derive(Debug)]
pub struct Authorized<R> {
    pub decision: Decision,
    pub resource: Option<R>,
}

impl<R> Authorized<R> {
    pub fn is_allowed(&self) -> bool {
        self.decision.is_allowed()
    }

    pub fn into_result(self) -> Result<Option<R>, DenyReason> {
        match self.decision {
            Decision::Allow => Ok(self.resource),
            Decision::Deny(reason) => Err(reason),
        }
    }

    /// Like [`into_result`](Self::into_result) for instance routes, where an allowed decision always carries the resource.
    pub fn into_resource(self) -> Result<R, DenyReason> {
        self.into_result()?.ok_or(DenyReason::ResourceNotFound)
    }
}

/// The policy evaluator: immutable after construction and shared across requests.
///
/// Evaluation order:
/// 1. unregistered type or unsupported action -> deny
/// 2. safe action on an anonymously readable type -> allow
/// 3. unauthenticated -> deny
/// 4. non-reflexive action aimed at the actor -> deny
/// 5. each policy family in turn, OR-composed
#[derive(Debug, Clone)]
pub struct Gate {
    registry: RoleRegistry,
    catalog: ActionCatalog,
    table: PolicyTable,
}

impl Gate {
    /// Builds the gate, rejecting inconsistent configuration up front.
    pub fn new(registry: RoleRegistry, catalog: ActionCatalog, table: PolicyTable) -> ConfigResult<Self> {
        table.validate(&registry, &catalog)?;
        Ok(Self { registry, catalog, table })
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn table(&self) -> &PolicyTable {
        &self.table
    }

    pub fn evaluate(
        &self,
        identity: &IdentityContext,
        action: Action,
        resource: Option<&dyn PolicyResource>,
        resource_type: &str,
    ) -> Decision {
        let decision = match self.precheck(identity, action, resource_type) {
            Err(decision) => decision,
            Ok(policy) => self.evaluate_policy(policy, identity, action, resource, resource_type),
        };

        trace_decision(identity, action, resource_type, resource.map(|r| r.resource_id()), decision);
        decision
    }

    /// Loads the target (if any) once, then evaluates against it.
    ///
    /// A missing target becomes `Deny(resource not found)`; lookup errors are
    /// returned unchanged.
    pub async fn authorize<R, L>(
        &self,
        identity: &IdentityContext,
        action: Action,
        resource_type: &str,
        target: Option<Uuid>,
        lookup: &L,
    ) -> Result<Authorized<R>, L::Error>
    where
        R: PolicyResource,
        L: ResourceLookup<R> + ?Sized,
    {
        if let Err(decision @ Decision::Deny(_)) = self.precheck(identity, action, resource_type) {
            trace_decision(identity, action, resource_type, target, decision);
            return Ok(Authorized { decision, resource: None });
        }

        let resource = match target {
            None => None,
            Some(id) => match lookup.fetch(id).await? {
                Some(resource) => Some(resource),
                None => {
                    let decision = Decision::Deny(DenyReason::ResourceNotFound);
                    trace_decision(identity, action, resource_type, target, decision);
                    return Ok(Authorized { decision, resource: None });
                }
            },
        };

        let decision = self.evaluate(
            identity,
            action,
            resource.as_ref().map(|r| r as &dyn PolicyResource),
            resource_type,
        );

        Ok(Authorized { decision, resource })
    }

    /// Identity-only steps. `Err` carries a final decision.
    fn precheck(
        &self,
        identity: &IdentityContext,
        action: Action,
        resource_type: &str,
    ) -> Result<&ResourcePolicy, Decision> {
        let Some(policy) = self.table.get(resource_type) else {
            tracing::error!(resource_type = %resource_type, "no policy registered for resource type");
            return Err(Decision::Deny(DenyReason::NoPolicyRegistered));
        };

        if !self.catalog.supports(resource_type, action) {
            return Err(Decision::Deny(DenyReason::ActionNotSupported));
        }

        if action.is_safe() && policy.anonymous_read {
            return Err(Decision::Allow);
        }

        if !identity.is_authenticated() {
            return Err(Decision::Deny(DenyReason::AuthenticationRequired));
        }

        Ok(policy)
    }

    fn evaluate_policy(
        &self,
        policy: &ResourcePolicy,
        identity: &IdentityContext,
        action: Action,
        resource: Option<&dyn PolicyResource>,
        resource_type: &str,
    ) -> Decision {
        let facts = Facts {
            identity,
            action,
            resource_type,
            target_id: resource.map(|r| r.resource_id()),
            owner: self.resolve_owner(policy, resource, resource_type),
            capabilities: self.resolve_capabilities(identity),
            owner_only_reads: policy.owner_only_reads,
        };

        if policy.non_reflexive.contains(&action) && predicate::is_self_target(&facts) {
            return Decision::Deny(DenyReason::SelfTargetNotPermitted);
        }

        policy
            .families
            .iter()
            .map(|family| match family {
                PolicyFamily::RoleCapability => role_capability(&facts),
                PolicyFamily::OwnershipOverride => ownership_override(&facts),
            })
            .reduce(Decision::or)
            .unwrap_or(Decision::Deny(DenyReason::NoPolicyRegistered))
    }

    fn resolve_owner(
        &self,
        policy: &ResourcePolicy,
        resource: Option<&dyn PolicyResource>,
        resource_type: &str,
    ) -> Option<Uuid> {
        let resource = resource?;
        if !policy.uses(PolicyFamily::OwnershipOverride) {
            return None;
        }

        match policy.ownership_resolver(resource_type).owner_of(resource) {
            Ok(owner) => owner,
            Err(err) => {
                tracing::error!(error = %err, resource_type = %resource_type, "owner could not be resolved");
                None
            }
        }
    }

    fn resolve_capabilities(&self, identity: &IdentityContext) -> Option<&CapabilitySet> {
        let role = identity.role()?;
        match self.registry.capabilities_of(role) {
            Ok(capabilities) => Some(capabilities),
            Err(err) => {
                tracing::error!(error = %err, "identity carries a role missing from the registry");
                None
            }
        }
    }
}

fn role_capability(facts: &Facts<'_>) -> Decision {
    let capable = all(predicate::has_role, predicate::role_capable);

    if capable(facts) {
        Decision::Allow
    } else if predicate::has_role(facts) {
        Decision::Deny(DenyReason::RoleLacksCapability)
    } else {
        Decision::Deny(DenyReason::NoRoleAssigned)
    }
}

fn ownership_override(facts: &Facts<'_>) -> Decision {
    // Restricted types still allow listing; handlers scope the rows.
    let open_read = all(
        predicate::safe_action,
        not(all(predicate::reads_restricted, predicate::has_target)),
    );
    let open_to_authenticated = any(open_read, any(predicate::creating, predicate::relationship_action));
    let owns_target = all(predicate::has_target, predicate::is_owner);

    if open_to_authenticated(facts) || owns_target(facts) {
        Decision::Allow
    } else if predicate::has_target(facts) {
        Decision::Deny(DenyReason::NotTheOwner)
    } else {
        Decision::Deny(DenyReason::NoTargetToOwn)
    }
}

fn trace_decision(
    identity: &IdentityContext,
    action: Action,
    resource_type: &str,
    target: Option<Uuid>,
    decision: Decision,
) {
    match decision {
        Decision::Allow => tracing::debug!(
            principal = ?identity.principal_id(),
            role = ?identity.role(),
            action = %action,
            resource_type = %resource_type,
            target = ?target,
            "access allowed"
        ),
        Decision::Deny(reason) => tracing::info!(
            principal = ?identity.principal_id(),
            role = ?identity.role(),
            action = %action,
            resource_type = %resource_type,
            target = ?target,
            reason = %reason,
            "access denied"
        ),
    }
}
