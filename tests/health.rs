mod common;

use anyhow::Result;
use axum::http::StatusCode;

#[tokio::test]
async fn health_endpoint_reports_db_ok() -> Result<()> {
    let app = common::spawn().await?;

    let (status, v) = app.get("/api/health", None).await?;
    assert_eq!(status, StatusCode::OK, "health endpoint did not return 200");

    let db_ok = v.get("db_ok").and_then(|b| b.as_bool()).unwrap_or(false);
    assert!(db_ok, "expected db_ok: true, got: {}", v);
    assert_eq!(v.get("roles").and_then(|r| r.as_u64()), Some(5));

    Ok(())
}
