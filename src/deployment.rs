//! The concrete access configuration served by this application.
//!
//! Two policy families live side by side:
//! - role capability for the HR records and the library catalog
//! - ownership override for blog posts, comments, user accounts and notifications

use std::path::Path;

use crate::authz::resources::{BOOK, COMMENT, DEPARTMENT, EMPLOYEE, NOTIFICATION, POST, ROLE_ASSIGNMENT, USER};
use crate::authz::roles::{ADMIN, CUSTOMIZED, HR_STAFF, LIBRARIAN, MEMBER};
use crate::authz::{
    Action, ActionCatalog, ConfigResult, Gate, PolicyFamily, PolicyTable, ResourcePolicy, Role, RoleRegistry,
};
use crate::models::blog::{Comment, Post};
use crate::models::notification::Notification;
use crate::models::user::User;

pub fn role_registry() -> ConfigResult<RoleRegistry> {
    let roles = [
        Role::new(ADMIN).describe("Full access to every resource").grant_all(),
        Role::new(HR_STAFF)
            .describe("Read-only access to employee records")
            .grant_on(EMPLOYEE, [Action::List, Action::Retrieve]),
        Role::new(CUSTOMIZED)
            .describe("May view and hire employees")
            .grant_on(EMPLOYEE, [Action::List, Action::Retrieve, Action::Create]),
        Role::new(LIBRARIAN)
            .describe("Maintains the book catalog")
            .grant_on(BOOK, [Action::List, Action::Retrieve, Action::Create, Action::Update]),
        Role::new(MEMBER)
            .describe("Library member")
            .grant_on(BOOK, [Action::List, Action::Retrieve]),
    ];

    RoleRegistry::from_roles(roles)
}

pub fn action_catalog() -> ActionCatalog {
    ActionCatalog::new()
        .with_crud(POST)
        .with_crud(COMMENT)
        .with_crud(EMPLOYEE)
        .with_crud(DEPARTMENT)
        .with_crud(BOOK)
        .with_actions(
            USER,
            [Action::Retrieve, Action::Update, Action::Delete, Action::Follow, Action::Unfollow],
        )
        .with_actions(ROLE_ASSIGNMENT, [Action::Update])
        .with_actions(NOTIFICATION, [Action::List, Action::Retrieve, Action::Update])
}

pub fn policy_table() -> PolicyTable {
    PolicyTable::new()
        .register(POST, ResourcePolicy::ownership("author_id").fields_of::<Post>().anonymous_read())
        .register(COMMENT, ResourcePolicy::ownership("author_id").fields_of::<Comment>().anonymous_read())
        .register(
            USER,
            ResourcePolicy::ownership("id")
                .fields_of::<User>()
                .or(PolicyFamily::RoleCapability)
                .non_reflexive([Action::Follow, Action::Unfollow]),
        )
        .register(ROLE_ASSIGNMENT, ResourcePolicy::role_capability())
        .register(EMPLOYEE, ResourcePolicy::role_capability())
        .register(DEPARTMENT, ResourcePolicy::role_capability())
        .register(BOOK, ResourcePolicy::role_capability().anonymous_read())
        .register(
            NOTIFICATION,
            ResourcePolicy::ownership("recipient_id")
                .fields_of::<Notification>()
                .owner_only_reads(),
        )
}

/// Registry from `path` when given, else the built-in one.
pub fn load_registry(path: Option<&Path>) -> ConfigResult<RoleRegistry> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading role registry");
            RoleRegistry::from_path(path)
        }
        None => role_registry(),
    }
}

/// Validated gate over `registry` and the built-in catalog and table.
pub fn gate(registry: RoleRegistry) -> ConfigResult<Gate> {
    Gate::new(registry, action_catalog(), policy_table())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::authz::{Decision, DenyReason, IdentityContext, PolicyResource};

    struct Row {
        id: Uuid,
        author_id: Option<Uuid>,
    }

    impl PolicyResource for Row {
        fn resource_id(&self) -> Uuid {
            self.id
        }

        fn principal_field(&self, field: &str) -> Option<Option<Uuid>> {
            match field {
                "author_id" => Some(self.author_id),
                _ => None,
            }
        }
    }

    fn as_role(gate: &Gate, role: &str) -> IdentityContext {
        IdentityContext::authenticated(Uuid::new_v4(), Some(role), gate.registry()).unwrap()
    }

    #[test]
    fn built_in_configuration_validates() {
        let gate = gate(role_registry().unwrap()).unwrap();
        assert_eq!(gate.registry().len(), 5);
    }

    #[test]
    fn department_is_admin_only() {
        let gate = gate(role_registry().unwrap()).unwrap();
        assert_eq!(gate.evaluate(&as_role(&gate, ADMIN), Action::Create, None, DEPARTMENT), Decision::Allow);
        for role in [HR_STAFF, CUSTOMIZED, LIBRARIAN, MEMBER] {
            assert_eq!(
                gate.evaluate(&as_role(&gate, role), Action::List, None, DEPARTMENT),
                Decision::Deny(DenyReason::RoleLacksCapability),
                "{role} should not list departments"
            );
        }
    }

    #[test]
    fn employee_matrix_matches_hr_rules() {
        let gate = gate(role_registry().unwrap()).unwrap();
        let expectations = [
            (ADMIN, [true, true, true, true, true]),
            (HR_STAFF, [true, true, false, false, false]),
            (CUSTOMIZED, [true, true, true, false, false]),
            (MEMBER, [false, false, false, false, false]),
        ];

        for (role, allowed) in expectations {
            let identity = as_role(&gate, role);
            for (action, expected) in Action::CRUD.into_iter().zip(allowed) {
                let decision = gate.evaluate(&identity, action, None, EMPLOYEE);
                assert_eq!(decision.is_allowed(), expected, "{role} {action}");
            }
        }
    }

    #[test]
    fn book_catalog_is_public_to_read() {
        let gate = gate(role_registry().unwrap()).unwrap();
        let anon = IdentityContext::anonymous();
        assert_eq!(gate.evaluate(&anon, Action::List, None, BOOK), Decision::Allow);
        assert_eq!(
            gate.evaluate(&anon, Action::Create, None, BOOK),
            Decision::Deny(DenyReason::AuthenticationRequired)
        );
        assert_eq!(gate.evaluate(&as_role(&gate, LIBRARIAN), Action::Update, None, BOOK), Decision::Allow);
        assert_eq!(
            gate.evaluate(&as_role(&gate, LIBRARIAN), Action::Delete, None, BOOK),
            Decision::Deny(DenyReason::RoleLacksCapability)
        );
        assert_eq!(
            gate.evaluate(&as_role(&gate, MEMBER), Action::Create, None, BOOK),
            Decision::Deny(DenyReason::RoleLacksCapability)
        );
    }

    #[test]
    fn admin_does_not_bypass_post_ownership() {
        let gate = gate(role_registry().unwrap()).unwrap();
        let post = Row { id: Uuid::new_v4(), author_id: Some(Uuid::new_v4()) };
        assert_eq!(
            gate.evaluate(&as_role(&gate, ADMIN), Action::Delete, Some(&post), POST),
            Decision::Deny(DenyReason::NotTheOwner)
        );
    }

    #[test]
    fn notifications_are_private_to_their_recipient() {
        let gate = gate(role_registry().unwrap()).unwrap();
        let admin = as_role(&gate, ADMIN);
        let recipient = as_role(&gate, MEMBER);
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_id: recipient.principal_id().unwrap(),
            actor_id: admin.principal_id().unwrap(),
            verb: "started following you".into(),
            target_type: USER.into(),
            target_id: recipient.principal_id().unwrap(),
            read: false,
            created_at: chrono::Utc::now(),
        };

        assert_eq!(gate.evaluate(&recipient, Action::Retrieve, Some(&notification), NOTIFICATION), Decision::Allow);
        assert_eq!(
            gate.evaluate(&admin, Action::Retrieve, Some(&notification), NOTIFICATION),
            Decision::Deny(DenyReason::NotTheOwner)
        );
        assert_eq!(
            gate.evaluate(&recipient, Action::Delete, Some(&notification), NOTIFICATION),
            Decision::Deny(DenyReason::ActionNotSupported)
        );
    }

    #[test]
    fn misspelled_ownership_field_fails_startup() {
        let table = policy_table().register(POST, ResourcePolicy::ownership("author").fields_of::<Post>());
        let err = Gate::new(role_registry().unwrap(), action_catalog(), table).unwrap_err();
        assert_eq!(
            err,
            crate::authz::ConfigError::UnknownOwnershipField {
                resource_type: POST.into(),
                field: "author".into(),
            }
        );
    }

    #[test]
    fn role_assignment_requires_admin() {
        let gate = gate(role_registry().unwrap()).unwrap();
        assert_eq!(gate.evaluate(&as_role(&gate, ADMIN), Action::Update, None, ROLE_ASSIGNMENT), Decision::Allow);
        assert_eq!(
            gate.evaluate(&as_role(&gate, HR_STAFF), Action::Update, None, ROLE_ASSIGNMENT),
            Decision::Deny(DenyReason::RoleLacksCapability)
        );
    }
}
