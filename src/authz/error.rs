//! Configuration errors raised while building the policy layer.
//!
//! These are fatal and surface at startup. Per-request outcomes are never
//! errors; they are [`Decision`](super::Decision) values.

use thiserror::Error;

use super::action::Action;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("role registered twice: {0}")]
    DuplicateRole(String),

    #[error("resource type {0} has no ownership field")]
    NotOwnable(String),

    #[error("{resource_type} has no principal field named {field}")]
    UnknownOwnershipField { resource_type: String, field: String },

    #[error("resource type {0} cannot be both anonymously readable and owner-only")]
    ConflictingReadAccess(String),

    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("resource type {0} has no policy family")]
    EmptyPolicy(String),

    #[error("action {action} is not in the catalog of {resource_type}")]
    ActionNotInCatalog { resource_type: String, action: Action },

    #[error("failed to load role registry: {0}")]
    Load(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
