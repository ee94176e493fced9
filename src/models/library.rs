use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::PolicyResource;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author_name: String,
    pub publication_year: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PolicyResource for Book {
    fn resource_id(&self) -> Uuid {
        self.id
    }

    fn principal_field(&self, _field: &str) -> Option<Option<Uuid>> {
        None
    }
}

#[derive(Debug, Deserialize)]
pub struct BookCreateRequest {
    pub title: String,
    pub author_name: String,
    pub publication_year: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BookUpdateRequest {
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub publication_year: Option<i64>,
}
