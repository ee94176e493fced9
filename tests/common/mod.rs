#![allow(dead_code)]

use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

use rolegate::accounts::{self, NewAccount};
use rolegate::config::AppConfig;
use rolegate::create_app_with;
use rolegate::deployment;
use rolegate::errors::AppError;
use rolegate::jwt::JwtConfig;

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    jwt: JwtConfig,
    _dir: TempDir,
}

pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

pub async fn spawn() -> Result<TestApp> {
    spawn_with(|_| {}).await
}

pub async fn spawn_with(configure: impl FnOnce(&mut AppConfig)) -> Result<TestApp> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("test.db");

    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;

    let jwt = JwtConfig::new("test-secret", 1);
    let mut config = AppConfig::with_jwt(jwt.clone());
    configure(&mut config);

    let app = create_app_with(pool.clone(), config).await?;

    Ok(TestApp {
        app,
        pool,
        jwt,
        _dir: dir,
    })
}

impl TestApp {
    /// Rebuilds the app over the same database, as a restart with new configuration would.
    pub async fn restart_with(self, configure: impl FnOnce(&mut AppConfig)) -> Result<TestApp, AppError> {
        let mut config = AppConfig::with_jwt(self.jwt.clone());
        configure(&mut config);

        let app = create_app_with(self.pool.clone(), config).await?;
        Ok(TestApp { app, ..self })
    }

    /// Writes `contents` next to the test database and returns its path.
    pub fn write_file(&self, name: &str, contents: &str) -> Result<std::path::PathBuf> {
        let path = self._dir.path().join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Creates an account directly, bypassing self-registration so any role can be given.
    pub async fn user(&self, username: &str, role: Option<&str>) -> Result<TestUser> {
        let registry = deployment::role_registry()?;
        let account = NewAccount {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "password123".to_string(),
        };
        let user = accounts::create_account(&self.pool, &registry, account, role).await?;
        let token = self.jwt.encode(user.id)?;

        Ok(TestUser { id: user.id, token })
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }

        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let resp = self.app.clone().oneshot(req).await?;
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok((status, value))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::DELETE, uri, token, None).await
    }
}

pub fn id_of(value: &Value) -> Uuid {
    value
        .get("id")
        .and_then(|id| id.as_str())
        .and_then(|id| Uuid::parse_str(id).ok())
        .unwrap_or_else(|| panic!("response carries no id: {value}"))
}

pub fn message_of(value: &Value) -> &str {
    value.get("message").and_then(|m| m.as_str()).unwrap_or_default()
}
