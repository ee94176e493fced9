use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::accounts::{self, NewAccount};
use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::jwt::Identity;
use crate::models::user::{AuthResponse, DbUser, LoginRequest, Me, RegisterRequest, User};
use crate::utils::verify_password;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    message: String,
}

/// Self-service sign-up. The role is always the configured default.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let account = NewAccount {
        username: payload.username,
        email: payload.email,
        password: payload.password,
    };

    let user = accounts::create_account(
        &state.pool,
        state.gate.registry(),
        account,
        state.config.default_role.as_deref(),
    )
    .await?;

    let token = state.jwt.encode(user.id)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let db_user = sqlx::query_as::<_, DbUser>(
        "SELECT id, username, email, password_hash, role, created_at, updated_at FROM users WHERE username = ?",
    )
    .bind(payload.username.trim())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;

    let password_ok = verify_password(&payload.password, &db_user.password_hash)?;
    if !password_ok {
        return Err(AppError::unauthorized("invalid credentials"));
    }

    let token = state.jwt.encode(db_user.id)?;
    let user: User = db_user.into();

    Ok(Json(AuthResponse { token, user }))
}

pub async fn me(State(state): State<AppState>, Identity(identity): Identity) -> AppResult<Json<Me>> {
    let user_id = identity
        .principal_id()
        .ok_or_else(|| AppError::unauthorized("authentication required"))?;

    let user = accounts::fetch_user(&state.pool, user_id).await?;
    let profile = accounts::fetch_profile(&state.pool, user_id).await?;

    Ok(Json(Me { user, profile }))
}

pub async fn logout(Identity(identity): Identity) -> AppResult<Json<MessageResponse>> {
    if !identity.is_authenticated() {
        return Err(AppError::unauthorized("authentication required"));
    }

    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}
