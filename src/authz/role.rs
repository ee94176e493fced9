use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::action::Action;
use super::error::{ConfigError, ConfigResult};

/// One grant: an action (or every action) on a resource type (or every type).
///
/// Textual form: `*`, `update`, `*:department`, `create:employee`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Capability {
    pub action: Option<Action>,
    pub resource_type: Option<String>,
}

impl Capability {
    pub fn everything() -> Self {
        Self { action: None, resource_type: None }
    }

    pub fn action(action: Action) -> Self {
        Self { action: Some(action), resource_type: None }
    }

    pub fn scoped(action: Action, resource_type: &str) -> Self {
        Self {
            action: Some(action),
            resource_type: Some(resource_type.to_string()),
        }
    }

    pub fn covers(&self, action: Action, resource_type: &str) -> bool {
        let action_ok = self.action.map_or(true, |granted| granted == action);
        let type_ok = self
            .resource_type
            .as_deref()
            .map_or(true, |granted| granted == resource_type);
        action_ok && type_ok
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = self.action.map(|a| a.as_str()).unwrap_or("*");
        match &self.resource_type {
            Some(resource_type) => write!(f, "{action}:{resource_type}"),
            None => f.write_str(action),
        }
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (action, resource_type) = match s.split_once(':') {
            Some((action, resource_type)) => (action.trim(), Some(resource_type.trim())),
            None => (s, None),
        };

        let action = match action {
            "*" => None,
            other => Some(other.parse::<Action>().map_err(|e| e.to_string())?),
        };

        let resource_type = match resource_type {
            Some("") => return Err(format!("empty resource type in `{s}`")),
            Some("*") | None => None,
            Some(name) => Some(name.to_string()),
        };

        Ok(Self { action, resource_type })
    }
}

impl TryFrom<String> for Capability {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Capability> for String {
    fn from(value: Capability) -> Self {
        value.to_string()
    }
}

/// The grants of one role. An empty set denies everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, capability: Capability) {
        self.0.insert(capability);
    }

    pub fn allows(&self, action: Action, resource_type: &str) -> bool {
        self.0.iter().any(|c| c.covers(action, resource_type))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.0.iter()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<T: IntoIterator<Item = Capability>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A named, immutable capability bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub capabilities: CapabilitySet,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            capabilities: CapabilitySet::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn grant(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    pub fn grant_all(self) -> Self {
        self.grant(Capability::everything())
    }

    /// Grant each action on one resource type.
    pub fn grant_on(mut self, resource_type: &str, actions: impl IntoIterator<Item = Action>) -> Self {
        for action in actions {
            self.capabilities.insert(Capability::scoped(action, resource_type));
        }
        self
    }
}

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    roles: Vec<Role>,
}

/// Read-only role table built once at startup and shared across requests.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    roles: BTreeMap<String, Role>,
}

impl RoleRegistry {
    pub fn from_roles(roles: impl IntoIterator<Item = Role>) -> ConfigResult<Self> {
        let mut map = BTreeMap::new();
        for role in roles {
            if map.contains_key(&role.name) {
                return Err(ConfigError::DuplicateRole(role.name));
            }
            map.insert(role.name.clone(), role);
        }
        Ok(Self { roles: map })
    }

    /// Parse a `{"roles": [...]}` document.
    pub fn from_json(source: &str) -> ConfigResult<Self> {
        let document: RegistryDocument =
            serde_json::from_str(source).map_err(|err| ConfigError::Load(err.to_string()))?;
        Self::from_roles(document.roles)
    }

    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::Load(format!("{}: {err}", path.display())))?;
        Self::from_json(&source)
    }

    pub fn resolve(&self, name: &str) -> ConfigResult<&Role> {
        self.roles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownRole(name.to_string()))
    }

    pub fn capabilities_of(&self, name: &str) -> ConfigResult<&CapabilitySet> {
        self.resolve(name).map(|role| &role.capabilities)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> RoleRegistry {
        RoleRegistry::from_roles([
            Role::new("Admin").grant_all(),
            Role::new("HR Staff").grant_on("employee", [Action::List, Action::Retrieve]),
            Role::new("Idle"),
        ])
        .unwrap()
    }

    #[test]
    fn wildcard_covers_every_action_and_type() {
        let registry = registry();
        let admin = registry.capabilities_of("Admin").unwrap();
        for action in Action::ALL {
            assert!(admin.allows(action, "employee"));
            assert!(admin.allows(action, "department"));
        }
    }

    #[test]
    fn scoped_grants_stay_on_their_type() {
        let registry = registry();
        let hr = registry.capabilities_of("HR Staff").unwrap();
        assert!(hr.allows(Action::List, "employee"));
        assert!(hr.allows(Action::Retrieve, "employee"));
        assert!(!hr.allows(Action::Create, "employee"));
        assert!(!hr.allows(Action::List, "department"));
    }

    #[test]
    fn role_without_capabilities_denies_everything() {
        let registry = registry();
        let idle = registry.capabilities_of("Idle").unwrap();
        assert!(idle.is_empty());
        assert!(Action::ALL.iter().all(|a| !idle.allows(*a, "employee")));
    }

    #[test]
    fn unknown_role_is_a_config_error() {
        let err = registry().capabilities_of("Janitor").unwrap_err();
        assert_eq!(err, ConfigError::UnknownRole("Janitor".into()));
    }

    #[test]
    fn duplicate_roles_are_rejected() {
        let err = RoleRegistry::from_roles([Role::new("Admin"), Role::new("Admin")]).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateRole("Admin".into()));
    }

    #[test]
    fn capability_text_forms() {
        assert_eq!("*".parse::<Capability>().unwrap(), Capability::everything());
        assert_eq!("update".parse::<Capability>().unwrap(), Capability::action(Action::Update));
        assert_eq!(
            "create:employee".parse::<Capability>().unwrap(),
            Capability::scoped(Action::Create, "employee")
        );
        let any_on_book: Capability = "*:book".parse().unwrap();
        assert!(any_on_book.covers(Action::Delete, "book"));
        assert!(!any_on_book.covers(Action::Delete, "post"));
        assert_eq!(any_on_book.to_string(), "*:book");
        assert!("smash:book".parse::<Capability>().is_err());
        assert!("list:".parse::<Capability>().is_err());
    }

    #[test]
    fn loads_from_json_document() {
        let registry = RoleRegistry::from_json(
            r#"{"roles": [
                {"name": "Admin", "capabilities": ["*"]},
                {"name": "Member", "description": "reader", "capabilities": ["list:book", "retrieve:book"]}
            ]}"#,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        let member = registry.resolve("Member").unwrap();
        assert_eq!(member.description.as_deref(), Some("reader"));
        assert!(member.capabilities.allows(Action::List, "book"));
        assert!(!member.capabilities.allows(Action::Create, "book"));
    }

    #[test]
    fn malformed_json_is_a_load_error() {
        let err = RoleRegistry::from_json(r#"{"roles": [{"name": "X", "capabilities": ["fly"]}]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
