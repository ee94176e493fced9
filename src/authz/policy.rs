use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::action::{Action, ActionCatalog};
use super::error::{ConfigError, ConfigResult};
use super::ownership::{OwnershipResolver, PrincipalFields};
use super::role::RoleRegistry;

/// The two ways a resource type can decide unsafe actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyFamily {
    /// Allow when the principal's role holds a capability for the action.
    RoleCapability,
    /// Any authenticated principal may read and create; only the owner may update or delete.
    OwnershipOverride,
}

/// Static access configuration of one resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePolicy {
    pub anonymous_read: bool,
    pub families: Vec<PolicyFamily>,
    pub ownership_field: Option<String>,
    /// Principal-reference fields the resource type exposes.
    pub principal_fields: &'static [&'static str],
    /// Safe actions on an instance also require ownership.
    pub owner_only_reads: bool,
    pub non_reflexive: BTreeSet<Action>,
}

impl ResourcePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role_capability() -> Self {
        Self::new().or(PolicyFamily::RoleCapability)
    }

    pub fn ownership(field: &str) -> Self {
        Self::new().or(PolicyFamily::OwnershipOverride).owned_by(field)
    }

    /// Add a family; families are OR-composed in declaration order.
    pub fn or(mut self, family: PolicyFamily) -> Self {
        if !self.families.contains(&family) {
            self.families.push(family);
        }
        self
    }

    pub fn owned_by(mut self, field: &str) -> Self {
        self.ownership_field = Some(field.to_string());
        self
    }

    pub fn principal_fields(mut self, fields: &'static [&'static str]) -> Self {
        self.principal_fields = fields;
        self
    }

    pub fn fields_of<R: PrincipalFields>(self) -> Self {
        self.principal_fields(R::PRINCIPAL_FIELDS)
    }

    pub fn owner_only_reads(mut self) -> Self {
        self.owner_only_reads = true;
        self
    }

    pub fn anonymous_read(mut self) -> Self {
        self.anonymous_read = true;
        self
    }

    /// Actions that may not target the acting principal itself.
    pub fn non_reflexive(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.non_reflexive.extend(actions);
        self
    }

    pub fn uses(&self, family: PolicyFamily) -> bool {
        self.families.contains(&family)
    }

    pub fn ownership_resolver<'a>(&'a self, resource_type: &'a str) -> OwnershipResolver<'a> {
        OwnershipResolver::new(resource_type, self.ownership_field.as_deref())
    }
}

/// Resource type → policy, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    policies: BTreeMap<String, ResourcePolicy>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, resource_type: &str, policy: ResourcePolicy) -> Self {
        self.policies.insert(resource_type.to_string(), policy);
        self
    }

    pub fn get(&self, resource_type: &str) -> Option<&ResourcePolicy> {
        self.policies.get(resource_type)
    }

    pub fn require(&self, resource_type: &str) -> ConfigResult<&ResourcePolicy> {
        self.get(resource_type)
            .ok_or_else(|| ConfigError::UnknownResourceType(resource_type.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourcePolicy)> {
        self.policies.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Eager consistency check over every registered type and role.
    pub fn validate(&self, registry: &RoleRegistry, catalog: &ActionCatalog) -> ConfigResult<()> {
        for (resource_type, policy) in self.iter() {
            if policy.families.is_empty() {
                return Err(ConfigError::EmptyPolicy(resource_type.to_string()));
            }

            let owned = policy.uses(PolicyFamily::OwnershipOverride);
            if (owned || policy.owner_only_reads) && policy.ownership_field.is_none() {
                return Err(ConfigError::NotOwnable(resource_type.to_string()));
            }

            if let Some(field) = policy.ownership_field.as_deref() {
                if !policy.principal_fields.contains(&field) {
                    return Err(ConfigError::UnknownOwnershipField {
                        resource_type: resource_type.to_string(),
                        field: field.to_string(),
                    });
                }
            }

            if policy.owner_only_reads && policy.anonymous_read {
                return Err(ConfigError::ConflictingReadAccess(resource_type.to_string()));
            }

            if !catalog.contains_type(resource_type) {
                return Err(ConfigError::UnknownResourceType(resource_type.to_string()));
            }

            if let Some(action) = policy
                .non_reflexive
                .iter()
                .find(|action| !catalog.supports(resource_type, **action))
            {
                return Err(ConfigError::ActionNotInCatalog {
                    resource_type: resource_type.to_string(),
                    action: *action,
                });
            }
        }

        for role in registry.roles() {
            for capability in role.capabilities.iter() {
                if let Some(resource_type) = capability.resource_type.as_deref() {
                    self.require(resource_type)?;
                }
            }
        }

        Ok(())
    }
}
