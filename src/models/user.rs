use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::{PolicyResource, PrincipalFields};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrincipalFields for User {
    const PRINCIPAL_FIELDS: &'static [&'static str] = &["id"];
}

/// A user account is owned by the user it describes.
impl PolicyResource for User {
    fn resource_id(&self) -> Uuid {
        self.id
    }

    fn principal_field(&self, field: &str) -> Option<Option<Uuid>> {
        match field {
            "id" => Some(Some(self.id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbUser> for User {
    fn from(value: DbUser) -> Self {
        User {
            id: value.id,
            username: value.username,
            email: value.email,
            role: value.role,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub bio: String,
    pub location: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct Me {
    pub user: User,
    pub profile: Option<Profile>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    pub email: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleAssignmentRequest {
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub follower_id: Uuid,
    pub followee_id: Uuid,
    pub following: bool,
}
