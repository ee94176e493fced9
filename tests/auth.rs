mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn registration_and_login_edge_cases() -> Result<()> {
    let app = common::spawn().await?;

    // 1. Short password
    let (status, _) = app
        .post(
            "/auth/register",
            None,
            json!({ "username": "shorty", "email": "shorty@example.com", "password": "short" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "short password should be rejected");

    // 2. Valid registration; a requested role is ignored
    let (status, body) = app
        .post(
            "/auth/register",
            None,
            json!({ "username": "valid", "email": "valid@example.com", "password": "password123", "role": "Admin" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "Member");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

    // 3. Duplicate username
    let (status, _) = app
        .post(
            "/auth/register",
            None,
            json!({ "username": "valid", "email": "other@example.com", "password": "password123" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // 4. Wrong password and unknown user
    let (status, _) = app
        .post("/auth/login", None, json!({ "username": "valid", "password": "wrongpassword" }))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post("/auth/login", None, json!({ "username": "nobody", "password": "password123" }))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // 5. Good login, then /auth/me with the token
    let (status, body) = app
        .post("/auth/login", None, json!({ "username": "valid", "password": "password123" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap_or_default().to_string();

    let (status, me) = app.get("/auth/me", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["username"], "valid");
    assert_eq!(me["profile"]["bio"], "", "profile should be created with the account");

    Ok(())
}

#[tokio::test]
async fn missing_and_malformed_credentials() -> Result<()> {
    let app = common::spawn().await?;

    let (status, _) = app.get("/auth/me", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/auth/me", Some("not-a-jwt")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::POST, "/auth/logout", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn default_role_can_be_disabled() -> Result<()> {
    let app = common::spawn_with(|config| config.default_role = None).await?;

    let (status, body) = app
        .post(
            "/auth/register",
            None,
            json!({ "username": "plain", "email": "plain@example.com", "password": "password123" }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["user"]["role"].is_null());

    // Without a role, role-governed types are off limits.
    let token = body["token"].as_str().unwrap_or_default().to_string();
    let (status, body) = app.get("/employees", Some(&token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(common::message_of(&body), "forbidden: no role assigned");

    Ok(())
}

#[tokio::test]
async fn unknown_default_role_fails_at_startup() -> Result<()> {
    let result = common::spawn_with(|config| config.default_role = Some("Janitor".to_string())).await;
    assert!(result.is_err(), "an unregistered default role must be rejected");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_registrations_of_one_username_conflict() -> Result<()> {
    let app = common::spawn().await?;
    let body = |email: &str| json!({ "username": "racer", "email": email, "password": "password123" });

    let (first, second) = tokio::join!(
        app.post("/auth/register", None, body("one@example.com")),
        app.post("/auth/register", None, body("two@example.com")),
    );

    let mut statuses = [first?.0, second?.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE username = 'racer'")
        .fetch_one(&app.pool)
        .await?;
    assert_eq!(stored, 1);

    Ok(())
}
