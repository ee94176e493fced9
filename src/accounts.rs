//! Account lifecycle.
//!
//! Profile creation is an explicit step of [`create_account`], run in the
//! same transaction as the user insert, so every principal has its profile
//! and role in place before any request of theirs is evaluated.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::authz::{ConfigError, RoleRegistry};
use crate::config::OwnedResources;
use crate::errors::{AppError, AppResult};
use crate::models::user::{Profile, User};
use crate::utils::{hash_password, required, utc_now};

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Creates the user and its profile. `role` is stored as given; it must be registered.
pub async fn create_account(
    pool: &SqlitePool,
    registry: &RoleRegistry,
    account: NewAccount,
    role: Option<&str>,
) -> AppResult<User> {
    let username = required("username", &account.username)?;
    let email = required("email", &account.email)?;

    if let Some(role) = role {
        registry.resolve(role)?;
    }

    let password_hash = hash_password(&account.password)?;
    let now = utc_now();
    let user_id = Uuid::new_v4();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(&username)
    .bind(&email)
    .bind(password_hash)
    .bind(role)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|err| AppError::unique_violation(err, "username already in use"))?;

    sqlx::query("INSERT INTO profiles (user_id, bio, location, updated_at) VALUES (?, '', '', ?)")
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(user_id = %user_id, username = %username, role = ?role, "account created");

    fetch_user(pool, user_id).await
}

/// Replaces the stored role. Validated against the registry before writing.
pub async fn assign_role(
    pool: &SqlitePool,
    registry: &RoleRegistry,
    user_id: Uuid,
    role: Option<&str>,
) -> AppResult<User> {
    if let Some(role) = role {
        registry
            .resolve(role)
            .map_err(|err| AppError::bad_request(err.to_string()))?;
    }

    let affected = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
        .bind(role)
        .bind(utc_now())
        .bind(user_id)
        .execute(pool)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("user not found"));
    }

    tracing::info!(user_id = %user_id, role = ?role, "role assigned");

    fetch_user(pool, user_id).await
}

/// Deletes the account; owned posts and comments follow `owned`.
pub async fn delete_account(pool: &SqlitePool, user_id: Uuid, owned: OwnedResources) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    match owned {
        OwnedResources::Cascade => {
            sqlx::query("DELETE FROM comments WHERE author_id = ?")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM posts WHERE author_id = ?")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        OwnedResources::Orphan => {
            sqlx::query("UPDATE comments SET author_id = NULL WHERE author_id = ?")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE posts SET author_id = NULL WHERE author_id = ?")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    let affected = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("user not found"));
    }

    tx.commit().await?;

    tracing::info!(user_id = %user_id, owned_resources = ?owned, "account deleted");
    Ok(())
}

/// Fails with [`ConfigError::UnknownRole`] when an account holds a role the
/// registry does not define.
pub async fn verify_stored_roles(pool: &SqlitePool, registry: &RoleRegistry) -> AppResult<()> {
    let stored: Vec<String> = sqlx::query_scalar("SELECT DISTINCT role FROM users WHERE role IS NOT NULL ORDER BY role")
        .fetch_all(pool)
        .await?;

    if let Some(role) = stored.into_iter().find(|role| !registry.contains(role)) {
        tracing::error!(role = %role, "stored account role is missing from the role registry");
        return Err(ConfigError::UnknownRole(role).into());
    }

    Ok(())
}

pub async fn fetch_user(pool: &SqlitePool, user_id: Uuid) -> AppResult<User> {
    find_user(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))
}

pub async fn find_user(pool: &SqlitePool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, email, role, created_at, updated_at FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_profile(pool: &SqlitePool, user_id: Uuid) -> AppResult<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>(
        "SELECT user_id, bio, location, updated_at FROM profiles WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(profile)
}
