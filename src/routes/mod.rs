pub mod auth;
pub mod blog;
pub mod health;
pub mod hr;
pub mod library;
pub mod notifications;
pub mod users;

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{Action, Decision, IdentityContext, PolicyResource, ResourceLookup};
use crate::errors::{AppError, AppResult};

/// Collection-level check (list, create): there is no target to load.
pub(crate) fn guard_collection(
    state: &AppState,
    identity: &IdentityContext,
    action: Action,
    resource_type: &str,
) -> AppResult<()> {
    match state.gate.evaluate(identity, action, None, resource_type) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(AppError::from(reason)),
    }
}

/// Instance-level check: loads the target once and returns it on allow.
pub(crate) async fn guard_instance<R>(
    state: &AppState,
    identity: &IdentityContext,
    action: Action,
    resource_type: &str,
    id: Uuid,
) -> AppResult<R>
where
    R: PolicyResource,
    SqlitePool: ResourceLookup<R, Error = sqlx::Error>,
{
    let authorized = state
        .gate
        .authorize(identity, action, resource_type, Some(id), &state.pool)
        .await?;

    Ok(authorized.into_resource()?)
}
