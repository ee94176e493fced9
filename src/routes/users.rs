use axum::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::guard_instance;
use super::notifications::notify;
use crate::accounts;
use crate::app::AppState;
use crate::authz::resources::{ROLE_ASSIGNMENT, USER};
use crate::authz::{Action, IdentityContext, ResourceLookup};
use crate::errors::{AppError, AppResult};
use crate::jwt::Identity;
use crate::models::user::{FollowResponse, Me, ProfileUpdateRequest, RoleAssignmentRequest, User};
use crate::utils::{required, utc_now};

#[async_trait]
impl ResourceLookup<User> for SqlitePool {
    type Error = sqlx::Error;

    async fn fetch(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        accounts::find_user(self, id).await
    }
}

fn principal(identity: &IdentityContext) -> AppResult<Uuid> {
    identity
        .principal_id()
        .ok_or_else(|| AppError::unauthorized("authentication required"))
}

pub async fn get_user(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Me>> {
    let user: User = guard_instance(&state, &identity, Action::Retrieve, USER, id).await?;
    let profile = accounts::fetch_profile(&state.pool, user.id).await?;

    Ok(Json(Me { user, profile }))
}

/// Account owners edit their own email and profile; Admin may edit anyone's.
pub async fn update_user(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProfileUpdateRequest>,
) -> AppResult<Json<Me>> {
    let user: User = guard_instance(&state, &identity, Action::Update, USER, id).await?;
    let now = utc_now();

    let mut tx = state.pool.begin().await?;

    if let Some(email) = payload.email.as_deref() {
        let email = required("email", email)?;
        sqlx::query("UPDATE users SET email = ?, updated_at = ? WHERE id = ?")
            .bind(email)
            .bind(now)
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
    }

    if payload.bio.is_some() || payload.location.is_some() {
        sqlx::query(
            "UPDATE profiles SET bio = COALESCE(?, bio), location = COALESCE(?, location), updated_at = ? WHERE user_id = ?",
        )
        .bind(payload.bio.as_deref())
        .bind(payload.location.as_deref())
        .bind(now)
        .bind(user.id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let user = accounts::fetch_user(&state.pool, user.id).await?;
    let profile = accounts::fetch_profile(&state.pool, user.id).await?;

    Ok(Json(Me { user, profile }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let user: User = guard_instance(&state, &identity, Action::Delete, USER, id).await?;
    accounts::delete_account(&state.pool, user.id, state.config.owned_resources).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn follow(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<FollowResponse>> {
    let followee: User = guard_instance(&state, &identity, Action::Follow, USER, id).await?;
    let follower_id = principal(&identity)?;

    let inserted = sqlx::query("INSERT OR IGNORE INTO follows (follower_id, followee_id, created_at) VALUES (?, ?, ?)")
        .bind(follower_id)
        .bind(followee.id)
        .bind(utc_now())
        .execute(&state.pool)
        .await?;

    if inserted.rows_affected() > 0 {
        tracing::debug!(follower_id = %follower_id, followee_id = %followee.id, "follow recorded");
        notify(&state.pool, followee.id, follower_id, "started following you", USER, followee.id).await?;
    }

    Ok(Json(FollowResponse {
        follower_id,
        followee_id: followee.id,
        following: true,
    }))
}

pub async fn unfollow(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<FollowResponse>> {
    let followee: User = guard_instance(&state, &identity, Action::Unfollow, USER, id).await?;
    let follower_id = principal(&identity)?;

    sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
        .bind(follower_id)
        .bind(followee.id)
        .execute(&state.pool)
        .await?;

    Ok(Json(FollowResponse {
        follower_id,
        followee_id: followee.id,
        following: false,
    }))
}

pub async fn followers(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<User>>> {
    let user: User = guard_instance(&state, &identity, Action::Retrieve, USER, id).await?;

    let followers = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.email, u.role, u.created_at, u.updated_at
        FROM follows f
        JOIN users u ON u.id = f.follower_id
        WHERE f.followee_id = ?
        ORDER BY f.created_at ASC
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(followers))
}

/// Role assignment is a capability of its own, separate from editing the account.
pub async fn assign_role(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<RoleAssignmentRequest>,
) -> AppResult<Json<User>> {
    let user: User = guard_instance(&state, &identity, Action::Update, ROLE_ASSIGNMENT, id).await?;

    let role = payload.role.as_deref().map(str::trim).filter(|role| !role.is_empty());
    let updated = accounts::assign_role(&state.pool, state.gate.registry(), user.id, role).await?;

    Ok(Json(updated))
}
