use axum::async_trait;
use axum::extract::{Path, Query, State};
use axum::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use super::{guard_collection, guard_instance};
use crate::app::AppState;
use crate::authz::resources::NOTIFICATION;
use crate::authz::{Action, ResourceLookup};
use crate::errors::{AppError, AppResult};
use crate::jwt::Identity;
use crate::models::notification::{Notification, NotificationQuery};
use crate::utils::utc_now;

const NOTIFICATION_COLUMNS: &str = "id, recipient_id, actor_id, verb, target_type, target_id, read, created_at";

#[async_trait]
impl ResourceLookup<Notification> for SqlitePool {
    type Error = sqlx::Error;

    async fn fetch(&self, id: Uuid) -> Result<Option<Notification>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(&format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?"))
            .bind(id)
            .fetch_optional(self)
            .await
    }
}

/// Records that `actor_id` did `verb` to a `target_type` object of `recipient_id`.
/// Acting on one's own objects notifies nobody.
pub(crate) async fn notify(
    pool: &SqlitePool,
    recipient_id: Uuid,
    actor_id: Uuid,
    verb: &str,
    target_type: &str,
    target_id: Uuid,
) -> AppResult<()> {
    if recipient_id == actor_id {
        return Ok(());
    }

    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO notifications (id, recipient_id, actor_id, verb, target_type, target_id, read, created_at) VALUES (?, ?, ?, ?, ?, ?, 0, ?)",
    )
    .bind(id)
    .bind(recipient_id)
    .bind(actor_id)
    .bind(verb)
    .bind(target_type)
    .bind(target_id)
    .bind(utc_now())
    .execute(pool)
    .await?;

    tracing::debug!(notification_id = %id, recipient_id = %recipient_id, verb = %verb, "notification recorded");
    Ok(())
}

/// The caller's notifications, newest first; `unread=true` hides read ones.
pub async fn list_notifications(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    guard_collection(&state, &identity, Action::List, NOTIFICATION)?;
    let recipient_id = identity
        .principal_id()
        .ok_or_else(|| AppError::unauthorized("authentication required"))?;

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE recipient_id = "
    ));
    builder.push_bind(recipient_id);

    if query.unread {
        builder.push(" AND read = 0");
    }

    builder.push(" ORDER BY created_at DESC, rowid DESC");

    let notifications = builder
        .build_query_as::<Notification>()
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(notifications))
}

pub async fn get_notification(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Notification>> {
    let notification: Notification = guard_instance(&state, &identity, Action::Retrieve, NOTIFICATION, id).await?;
    Ok(Json(notification))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Notification>> {
    let mut notification: Notification = guard_instance(&state, &identity, Action::Update, NOTIFICATION, id).await?;

    sqlx::query("UPDATE notifications SET read = 1 WHERE id = ?")
        .bind(notification.id)
        .execute(&state.pool)
        .await?;

    notification.read = true;
    Ok(Json(notification))
}
