use uuid::Uuid;

use super::error::ConfigResult;
use super::role::RoleRegistry;

/// Snapshot of the acting principal for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    principal_id: Option<Uuid>,
    role: Option<String>,
}

impl IdentityContext {
    pub fn anonymous() -> Self {
        Self { principal_id: None, role: None }
    }

    /// Authenticated principal; the role, when present, must be registered.
    pub fn authenticated(principal_id: Uuid, role: Option<&str>, registry: &RoleRegistry) -> ConfigResult<Self> {
        let role = match role {
            Some(name) => Some(registry.resolve(name)?.name.clone()),
            None => None,
        };

        Ok(Self {
            principal_id: Some(principal_id),
            role,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal_id.is_some()
    }

    pub fn principal_id(&self) -> Option<Uuid> {
        self.principal_id
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::error::ConfigError;
    use crate::authz::role::Role;

    #[test]
    fn anonymous_has_no_identity() {
        let identity = IdentityContext::anonymous();
        assert!(!identity.is_authenticated());
        assert_eq!(identity.principal_id(), None);
        assert_eq!(identity.role(), None);
    }

    #[test]
    fn authenticated_role_must_be_registered() {
        let registry = RoleRegistry::from_roles([Role::new("Member")]).unwrap();
        let id = Uuid::new_v4();

        let member = IdentityContext::authenticated(id, Some("Member"), &registry).unwrap();
        assert!(member.is_authenticated());
        assert_eq!(member.role(), Some("Member"));

        let plain = IdentityContext::authenticated(id, None, &registry).unwrap();
        assert_eq!(plain.role(), None);

        let err = IdentityContext::authenticated(id, Some("Ghost"), &registry).unwrap_err();
        assert_eq!(err, ConfigError::UnknownRole("Ghost".into()));
    }
}
