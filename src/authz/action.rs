use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Actions a resource type can expose.
///
/// The safe/unsafe classification is a property of the action name itself,
/// so it is identical for every resource type in a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
    Follow,
    Unfollow,
}

impl Action {
    /// The five CRUD actions, in catalog order.
    pub const CRUD: [Action; 5] = [
        Action::List,
        Action::Retrieve,
        Action::Create,
        Action::Update,
        Action::Delete,
    ];

    pub const ALL: [Action; 7] = [
        Action::List,
        Action::Retrieve,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Follow,
        Action::Unfollow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::List => "list",
            Action::Retrieve => "retrieve",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Follow => "follow",
            Action::Unfollow => "unfollow",
        }
    }

    /// Read-only actions.
    pub fn is_safe(&self) -> bool {
        matches!(self, Action::List | Action::Retrieve)
    }

    /// Actions that change the actor's relationship to the target rather than the target itself.
    pub fn is_relationship(&self) -> bool {
        matches!(self, Action::Follow | Action::Unfollow)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .iter()
            .copied()
            .find(|action| action.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// Per-type ordered action lists, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    entries: BTreeMap<String, Vec<Action>>,
}

impl ActionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the ordered actions of a resource type. Duplicates are dropped, first occurrence wins.
    pub fn with_actions(mut self, resource_type: &str, actions: impl IntoIterator<Item = Action>) -> Self {
        let mut ordered: Vec<Action> = Vec::new();
        for action in actions {
            if !ordered.contains(&action) {
                ordered.push(action);
            }
        }
        self.entries.insert(resource_type.to_string(), ordered);
        self
    }

    /// Declare a resource type exposing the CRUD actions.
    pub fn with_crud(self, resource_type: &str) -> Self {
        self.with_actions(resource_type, Action::CRUD)
    }

    /// Ordered actions for the type, empty when the type is not in the catalog.
    pub fn actions_for(&self, resource_type: &str) -> &[Action] {
        self.entries
            .get(resource_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn supports(&self, resource_type: &str, action: Action) -> bool {
        self.actions_for(resource_type).contains(&action)
    }

    pub fn contains_type(&self, resource_type: &str) -> bool {
        self.entries.contains_key(resource_type)
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
