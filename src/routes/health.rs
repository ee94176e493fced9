use axum::extract::State;
use axum::Json;
use serde::Serialize;
use sqlx::query_scalar;

use crate::app::AppState;
use crate::errors::AppResult;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub db_ok: bool,
    pub db_error: Option<String>,
    pub roles: usize,
}

pub async fn health(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let db_check = query_scalar::<_, i64>("SELECT 1").fetch_one(&state.pool).await;
    let roles = state.gate.registry().len();

    match db_check {
        Ok(_) => Ok(Json(HealthResponse { status: "ok", db_ok: true, db_error: None, roles })),
        Err(e) => Ok(Json(HealthResponse { status: "ok", db_ok: false, db_error: Some(e.to_string()), roles })),
    }
}
