use std::path::PathBuf;

use crate::authz::roles::MEMBER;
use crate::errors::AppError;
use crate::jwt::JwtConfig;

/// What happens to a user's posts and comments when the account is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnedResources {
    /// Delete them with the account.
    Cascade,
    /// Keep them with no author; nobody can edit them afterwards.
    Orphan,
}

impl OwnedResources {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_lowercase().as_str() {
            "cascade" => Ok(Self::Cascade),
            "orphan" => Ok(Self::Orphan),
            other => Err(AppError::configuration(format!(
                "OWNED_RESOURCES_ON_DELETE must be `cascade` or `orphan`, got `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    /// Role stored on self-registered accounts; `None` registers them without one.
    pub default_role: Option<String>,
    pub role_registry_path: Option<PathBuf>,
    pub owned_resources: OwnedResources,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let jwt = JwtConfig::from_env()?;

        let default_role = match std::env::var("DEFAULT_ROLE") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(value.trim().to_string()),
            Err(_) => Some(MEMBER.to_string()),
        };

        let role_registry_path = std::env::var("ROLE_REGISTRY_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let owned_resources = match std::env::var("OWNED_RESOURCES_ON_DELETE") {
            Ok(value) => OwnedResources::parse(&value)?,
            Err(_) => OwnedResources::Orphan,
        };

        Ok(Self {
            jwt,
            default_role,
            role_registry_path,
            owned_resources,
        })
    }

    /// Config with built-in defaults around an explicit JWT setup.
    pub fn with_jwt(jwt: JwtConfig) -> Self {
        Self {
            jwt,
            default_role: Some(MEMBER.to_string()),
            role_registry_path: None,
            owned_resources: OwnedResources::Orphan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_resources_parsing() {
        assert_eq!(OwnedResources::parse("Cascade").unwrap(), OwnedResources::Cascade);
        assert_eq!(OwnedResources::parse(" orphan ").unwrap(), OwnedResources::Orphan);
        assert!(matches!(OwnedResources::parse("shred"), Err(AppError::Configuration(_))));
    }
}
