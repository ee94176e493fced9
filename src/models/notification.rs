use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::{PolicyResource, PrincipalFields};

/// Something `actor_id` did that concerns `recipient_id`.
///
/// `target_type`/`target_id` name the object acted on; the reference is not
/// enforced and may outlive it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub actor_id: Uuid,
    pub verb: String,
    pub target_type: String,
    pub target_id: Uuid,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl PrincipalFields for Notification {
    const PRINCIPAL_FIELDS: &'static [&'static str] = &["recipient_id", "actor_id"];
}

impl PolicyResource for Notification {
    fn resource_id(&self) -> Uuid {
        self.id
    }

    fn principal_field(&self, field: &str) -> Option<Option<Uuid>> {
        match field {
            "recipient_id" => Some(Some(self.recipient_id)),
            "actor_id" => Some(Some(self.actor_id)),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread: bool,
}
