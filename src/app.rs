use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::accounts;
use crate::authz::{ConfigError, Gate};
use crate::config::AppConfig;
use crate::deployment;
use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::routes::{auth, blog, health, hr, library, notifications, users};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub gate: Arc<Gate>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Loads and validates the access configuration; any inconsistency is fatal here rather than per request.
    pub fn new(pool: SqlitePool, config: AppConfig) -> Result<Self, AppError> {
        let registry = deployment::load_registry(config.role_registry_path.as_deref())?;
        let gate = deployment::gate(registry)?;

        if let Some(role) = config.default_role.as_deref() {
            if !gate.registry().contains(role) {
                return Err(ConfigError::UnknownRole(role.to_string()).into());
            }
        }

        tracing::info!(
            roles = gate.registry().len(),
            default_role = ?config.default_role,
            "access policy loaded"
        );

        Ok(Self {
            pool,
            jwt: Arc::new(config.jwt.clone()),
            gate: Arc::new(gate),
            config: Arc::new(config),
        })
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let config = AppConfig::from_env()?;
    create_app_with(pool, config).await
}

/// Builds the router over a migrated pool. Roles already stored on accounts
/// must all be known to the loaded registry.
pub async fn create_app_with(pool: SqlitePool, config: AppConfig) -> Result<Router, AppError> {
    let state = AppState::new(pool, config)?;
    accounts::verify_stored_roles(&state.pool, state.gate.registry()).await?;

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout));

    let post_routes = Router::new()
        .route("/", get(blog::list_posts).post(blog::create_post))
        .route("/:id", get(blog::get_post).put(blog::update_post).delete(blog::delete_post));

    let comment_routes = Router::new()
        .route("/", get(blog::list_comments).post(blog::create_comment))
        .route(
            "/:id",
            get(blog::get_comment).put(blog::update_comment).delete(blog::delete_comment),
        );

    let user_routes = Router::new()
        .route("/:id", get(users::get_user).put(users::update_user).delete(users::delete_user))
        .route("/:id/follow", post(users::follow))
        .route("/:id/unfollow", post(users::unfollow))
        .route("/:id/followers", get(users::followers))
        .route("/:id/role", put(users::assign_role));

    let department_routes = Router::new()
        .route("/", get(hr::list_departments).post(hr::create_department))
        .route(
            "/:id",
            get(hr::get_department).put(hr::update_department).delete(hr::delete_department),
        );

    let employee_routes = Router::new()
        .route("/", get(hr::list_employees).post(hr::create_employee))
        .route(
            "/:id",
            get(hr::get_employee).put(hr::update_employee).delete(hr::delete_employee),
        );

    let book_routes = Router::new()
        .route("/", get(library::list_books).post(library::create_book))
        .route(
            "/:id",
            get(library::get_book).put(library::update_book).delete(library::delete_book),
        );

    let notification_routes = Router::new()
        .route("/", get(notifications::list_notifications))
        .route("/:id", get(notifications::get_notification))
        .route("/:id/read", post(notifications::mark_read));

    let router = Router::new()
        .route("/api/health", get(health::health))
        .nest("/auth", auth_routes)
        .nest("/posts", post_routes)
        .nest("/comments", comment_routes)
        .nest("/users", user_routes)
        .nest("/departments", department_routes)
        .nest("/employees", employee_routes)
        .nest("/books", book_routes)
        .nest("/notifications", notification_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
