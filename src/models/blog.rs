use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::{PolicyResource, PrincipalFields};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Option<Uuid>,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrincipalFields for Post {
    const PRINCIPAL_FIELDS: &'static [&'static str] = &["author_id"];
}

impl PolicyResource for Post {
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

#[derive(Debug, Deserialize)]
pub struct PostCreateRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct PostUpdateRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PostQuery {
    pub author: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrincipalFields for Comment {
    const PRINCIPAL_FIELDS: &'static [&'static str] = &["author_id"];
}

impl PolicyResource for Comment {
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

#[derive(Debug, Deserialize)]
pub struct CommentCreateRequest {
    pub post_id: Uuid,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentUpdateRequest {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentQuery {
    pub post: Option<Uuid>,
}
